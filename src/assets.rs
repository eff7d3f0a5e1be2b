// Image file I/O: decode into RGB frames, encode frames by file extension.

use std::path::Path;

use image::{ImageError, ImageFormat};

use crate::error::{StudioError, StudioResult};
use crate::types::FrameBuffer;

/// Formats accepted by [`save_image`].
pub const SAVE_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp];

/// Read and decode an image file. Missing or unreadable files are
/// `InvalidInput`; bytes that do not decode are `Decode`.
pub fn load_image(path: impl AsRef<Path>) -> StudioResult<FrameBuffer> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| StudioError::invalid_input(format!("cannot read {}: {e}", path.display())))?;
    let frame = decode_image(&bytes)?;
    tracing::info!(
        path = %path.display(),
        width = frame.width(),
        height = frame.height(),
        "image loaded"
    );
    Ok(frame)
}

/// Decode in-memory encoded bytes (format sniffed from the content).
pub fn decode_image(bytes: &[u8]) -> StudioResult<FrameBuffer> {
    let img = image::load_from_memory(bytes).map_err(|e| StudioError::decode(e.to_string()))?;
    FrameBuffer::try_from(img.to_rgb8()).map_err(|e| StudioError::decode(e.to_string()))
}

/// Encode `frame` to `path`, picking the format from the extension.
pub fn save_image(path: impl AsRef<Path>, frame: &FrameBuffer) -> StudioResult<()> {
    let path = path.as_ref();
    let format = save_format(path)?;
    frame
        .to_rgb_image()
        .save_with_format(path, format)
        .map_err(|e| match e {
            ImageError::IoError(io) => StudioError::io(format!("write {}", path.display()), io),
            other => StudioError::encode(other.to_string()),
        })?;
    tracing::info!(path = %path.display(), ?format, "image saved");
    Ok(())
}

/// Encode `frame` into memory in the given format.
pub fn encode_image(frame: &FrameBuffer, format: ImageFormat) -> StudioResult<Vec<u8>> {
    if !SAVE_FORMATS.contains(&format) {
        return Err(StudioError::encode(format!("{format:?} is not a supported output format")));
    }
    let mut out = std::io::Cursor::new(Vec::new());
    frame
        .to_rgb_image()
        .write_to(&mut out, format)
        .map_err(|e| StudioError::encode(e.to_string()))?;
    Ok(out.into_inner())
}

fn save_format(path: &Path) -> StudioResult<ImageFormat> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| StudioError::encode(format!("cannot infer format from {}", path.display())))?;
    if SAVE_FORMATS.contains(&format) {
        Ok(format)
    } else {
        Err(StudioError::encode(format!(
            "{format:?} is not a supported output format ({})",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn sample() -> FrameBuffer {
        FrameBuffer::from_fn(5, 4, |x, y| Color::new(x as u8 * 40, y as u8 * 60, 17)).unwrap()
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let bytes = encode_image(&sample(), ImageFormat::Png).unwrap();
        assert_eq!(decode_image(&bytes).unwrap(), sample());
    }

    #[test]
    fn jpeg_round_trip_keeps_geometry() {
        let bytes = encode_image(&sample(), ImageFormat::Jpeg).unwrap();
        let back = decode_image(&bytes).unwrap();
        assert!(back.same_geometry(&sample()));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode_image(b"not an image"), Err(StudioError::Decode(_))));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(save_format(Path::new("a.png")).unwrap(), ImageFormat::Png);
        assert_eq!(save_format(Path::new("a.JPG")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(save_format(Path::new("a.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(save_format(Path::new("a.bmp")).unwrap(), ImageFormat::Bmp);
        assert!(matches!(save_format(Path::new("a.gif")), Err(StudioError::Encode(_))));
        assert!(matches!(save_format(Path::new("noext")), Err(StudioError::Encode(_))));
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = load_image("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
    }
}
