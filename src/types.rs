// Core pixel types shared by the session, filters, capture and overlay.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult};

/// How bytes are arranged inside a [`FrameBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelLayout {
    /// Interleaved R, G, B; one byte per channel.
    Rgb8,
}

impl PixelLayout {
    pub const fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
        }
    }
}

/// Immutable decoded pixel grid; the unit of history.
///
/// The payload sits behind an `Arc`, so cloning a frame (into history, the
/// redo tail or the display slot) never copies pixels. Every transformation
/// allocates a new payload. Two frames are equal iff dimensions, layout and
/// bytes are identical.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Arc<[u8]>,
}

impl FrameBuffer {
    /// Wrap an owned payload. Zero-sized frames and payloads whose length
    /// does not match `width * height * channels` are rejected.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> StudioResult<Self> {
        if width == 0 || height == 0 {
            return Err(StudioError::invalid_input(format!(
                "frame must not be empty (got {width}x{height})"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(layout.channels()))
            .ok_or_else(|| StudioError::invalid_input("frame size overflow"))?;
        if data.len() != expected {
            return Err(StudioError::invalid_input(format!(
                "payload is {} bytes, expected {expected} for {width}x{height} {layout:?}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            data: data.into(),
        })
    }

    /// Single-color RGB frame.
    pub fn solid(width: u32, height: u32, color: Color) -> StudioResult<Self> {
        Self::from_fn(width, height, |_, _| color)
    }

    /// RGB frame whose pixel at (x, y) is `f(x, y)`.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Color,
    ) -> StudioResult<Self> {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for y in 0..height {
            for x in 0..width {
                let c = f(x, y);
                data.extend_from_slice(&[c.r, c.g, c.b]);
            }
        }
        Self::new(width, height, PixelLayout::Rgb8, data)
    }

    /// New frame with the same geometry and layout but a different payload.
    /// Filters always produce a payload of matching length.
    pub(crate) fn with_data(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            layout: self.layout,
            data: data.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * self.channels();
        Some(Color::new(self.data[idx], self.data[idx + 1], self.data[idx + 2]))
    }

    pub fn same_geometry(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height && self.layout == other.layout
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        // Dimensions and length are validated at construction, so this cannot fail.
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            let idx = (y as usize * self.width as usize + x as usize) * 3;
            image::Rgb([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
        })
    }
}

impl TryFrom<image::RgbImage> for FrameBuffer {
    type Error = StudioError;

    fn try_from(img: image::RgbImage) -> StudioResult<Self> {
        let (w, h) = img.dimensions();
        Self::new(w, h, PixelLayout::Rgb8, img.into_raw())
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed as 0x00RRGGBB.
    pub const fn to_0rgb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn from_0rgb(px: u32) -> Self {
        Self::new(((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
    }
}

/// Display-space position in pixels. May lie outside the frame while the
/// pointer is dragged past its edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_length_and_empty_frames() {
        assert!(FrameBuffer::new(2, 2, PixelLayout::Rgb8, vec![0; 11]).is_err());
        assert!(FrameBuffer::new(0, 2, PixelLayout::Rgb8, vec![]).is_err());
        assert!(FrameBuffer::new(2, 2, PixelLayout::Rgb8, vec![0; 12]).is_ok());
    }

    #[test]
    fn equality_is_by_geometry_and_bytes() {
        let a = FrameBuffer::solid(3, 2, Color::RED).unwrap();
        let b = FrameBuffer::solid(3, 2, Color::RED).unwrap();
        let c = FrameBuffer::solid(2, 3, Color::RED).unwrap();
        let d = FrameBuffer::solid(3, 2, Color::WHITE).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn pixel_reads_interleaved_rgb() {
        let fb = FrameBuffer::from_fn(2, 2, |x, y| Color::new(x as u8, y as u8, 7)).unwrap();
        assert_eq!(fb.pixel(1, 0), Some(Color::new(1, 0, 7)));
        assert_eq!(fb.pixel(0, 1), Some(Color::new(0, 1, 7)));
        assert_eq!(fb.pixel(2, 0), None);
    }

    #[test]
    fn rgb_image_round_trip_keeps_channel_order() {
        let fb = FrameBuffer::from_fn(4, 3, |x, y| Color::new(x as u8 * 10, y as u8 * 20, 200)).unwrap();
        let back = FrameBuffer::try_from(fb.to_rgb_image()).unwrap();
        assert_eq!(back, fb);
    }

    #[test]
    fn packed_color_round_trip() {
        let c = Color::new(0x12, 0x34, 0x56);
        assert_eq!(c.to_0rgb(), 0x0012_3456);
        assert_eq!(Color::from_0rgb(c.to_0rgb()), c);
    }
}
