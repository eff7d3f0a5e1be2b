// Presentation boundary: turn frames into window pixels and back.
// The window wants a Vec<u32> where each pixel is 0x00RRGGBB.

use crate::error::{StudioError, StudioResult};
use crate::types::{Color, FrameBuffer, PixelLayout, Point};

/// Pack a frame into 0x00RRGGBB words, row-major.
pub fn pack_0rgb(frame: &FrameBuffer) -> Vec<u32> {
    frame
        .as_bytes()
        .chunks_exact(frame.channels())
        .map(|p| Color::new(p[0], p[1], p[2]).to_0rgb())
        .collect()
}

/// Inverse of [`pack_0rgb`]; channel order and values survive unchanged.
pub fn unpack_0rgb(pixels: &[u32], width: u32, height: u32) -> StudioResult<FrameBuffer> {
    if pixels.len() != width as usize * height as usize {
        return Err(StudioError::invalid_input(format!(
            "{} pixels do not fill {width}x{height}",
            pixels.len()
        )));
    }
    let mut data = Vec::with_capacity(pixels.len() * 3);
    for &px in pixels {
        let c = Color::from_0rgb(px);
        data.extend_from_slice(&[c.r, c.g, c.b]);
    }
    FrameBuffer::new(width, height, PixelLayout::Rgb8, data)
}

/// Where a frame lands inside a window after aspect-preserving scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Map a window position back into frame coordinates. Positions outside
    /// the viewport map outside the frame; the overlay clamps them.
    pub fn to_frame_point(&self, wx: f32, wy: f32, frame_w: u32, frame_h: u32) -> Point {
        if self.width == 0 || self.height == 0 {
            return Point::new(0, 0);
        }
        let fx = (wx - self.x as f32) * frame_w as f32 / self.width as f32;
        let fy = (wy - self.y as f32) * frame_h as f32 / self.height as f32;
        Point::new(fx.floor() as i32, fy.floor() as i32)
    }
}

/// Largest centered rectangle with the frame's aspect ratio that fits the view.
pub fn fit_viewport(frame_w: u32, frame_h: u32, view_w: u32, view_h: u32) -> Viewport {
    if frame_w == 0 || frame_h == 0 || view_w == 0 || view_h == 0 {
        return Viewport {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }
    // Compare view_w/view_h against frame_w/frame_h without floats.
    let (width, height) = if u64::from(view_w) * u64::from(frame_h) <= u64::from(view_h) * u64::from(frame_w) {
        let h = (u64::from(view_w) * u64::from(frame_h) / u64::from(frame_w)) as u32;
        (view_w, h.max(1))
    } else {
        let w = (u64::from(view_h) * u64::from(frame_w) / u64::from(frame_h)) as u32;
        (w.max(1), view_h)
    };
    Viewport {
        x: (view_w - width) / 2,
        y: (view_h - height) / 2,
        width,
        height,
    }
}

/// Nearest-neighbour scale `frame` into a `view_w` x `view_h` window,
/// letterboxed with `background` (0x00RRGGBB).
pub fn render_letterboxed(frame: &FrameBuffer, view_w: u32, view_h: u32, background: u32) -> (Vec<u32>, Viewport) {
    let vp = fit_viewport(frame.width(), frame.height(), view_w, view_h);
    let mut out = vec![background; view_w as usize * view_h as usize];
    if vp.width == 0 || vp.height == 0 {
        return (out, vp);
    }
    let src = frame.as_bytes();
    let (fw, fh) = (frame.width() as u64, frame.height() as u64);
    for vy in 0..vp.height {
        let sy = (u64::from(vy) * fh / u64::from(vp.height)) as usize;
        let row = (vp.y + vy) as usize * view_w as usize;
        for vx in 0..vp.width {
            let sx = (u64::from(vx) * fw / u64::from(vp.width)) as usize;
            let i = (sy * fw as usize + sx) * 3;
            out[row + (vp.x + vx) as usize] = Color::new(src[i], src[i + 1], src[i + 2]).to_0rgb();
        }
    }
    (out, vp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_round_trip_is_lossless() {
        let fb = FrameBuffer::from_fn(7, 3, |x, y| Color::new(x as u8 * 31, y as u8 * 77, 200 - x as u8)).unwrap();
        let packed = pack_0rgb(&fb);
        assert_eq!(packed[1], 0x001F_00C7);
        assert_eq!(unpack_0rgb(&packed, 7, 3).unwrap(), fb);
    }

    #[test]
    fn unpack_checks_length() {
        assert!(unpack_0rgb(&[0; 5], 2, 3).is_err());
    }

    #[test]
    fn fit_keeps_aspect_and_centers() {
        // 4:3 frame into a wide window: pillarbox
        assert_eq!(
            fit_viewport(640, 480, 1000, 600),
            Viewport { x: 100, y: 0, width: 800, height: 600 }
        );
        // 4:3 frame into a tall window: letterbox
        assert_eq!(
            fit_viewport(640, 480, 400, 600),
            Viewport { x: 0, y: 150, width: 400, height: 300 }
        );
        assert_eq!(fit_viewport(0, 10, 100, 100).width, 0);
    }

    #[test]
    fn letterbox_fills_bars_with_background() {
        let fb = FrameBuffer::solid(2, 1, Color::WHITE).unwrap();
        let (px, vp) = render_letterboxed(&fb, 4, 4, 0x0000_0000);
        assert_eq!(vp, Viewport { x: 0, y: 1, width: 4, height: 2 });
        assert_eq!(px[0], 0);
        assert_eq!(px[4], 0x00FF_FFFF);
        assert_eq!(px[15], 0);
    }

    #[test]
    fn window_points_map_back_to_frame() {
        let vp = fit_viewport(100, 100, 300, 200);
        assert_eq!(vp, Viewport { x: 50, y: 0, width: 200, height: 200 });
        assert_eq!(vp.to_frame_point(50.0, 0.0, 100, 100), Point::new(0, 0));
        assert_eq!(vp.to_frame_point(150.0, 100.0, 100, 100), Point::new(50, 50));
        assert_eq!(vp.to_frame_point(10.0, 0.0, 100, 100).x, -20);
    }
}
