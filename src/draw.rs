// Freehand overlay: strokes recorded as segments and painted onto a copy of the
// displayed frame. Nothing here ever touches edit history.

use crate::types::{Color, FrameBuffer, Point};

pub const DEFAULT_PEN_WIDTH: u32 = 5;
/// Widest pen a stroke can carry; larger requests are pinned here.
pub const MAX_PEN_WIDTH: u32 = 64;

/// One straight piece of a stroke, in display space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: Color,
    pub width: u32,
}

#[derive(Clone, Debug)]
pub struct DrawOverlay {
    width: u32,
    height: u32,
    segments: Vec<Segment>,
    last_point: Option<Point>,
    color: Color,
    pen_width: u32,
}

impl Default for DrawOverlay {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl DrawOverlay {
    /// Overlay for a display surface of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            segments: Vec::new(),
            last_point: None,
            color: Color::RED,
            pen_width: DEFAULT_PEN_WIDTH,
        }
    }

    /// Match the overlay to the displayed frame's size. A size change drops
    /// existing strokes since they no longer line up with anything.
    pub fn fit_to(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.clear();
        }
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn pen_width(&self) -> u32 {
        self.pen_width
    }

    pub fn set_width(&mut self, width: u32) {
        self.pen_width = width.clamp(1, MAX_PEN_WIDTH);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_drawing(&self) -> bool {
        self.last_point.is_some()
    }

    /// Pen down. Returns `false` when there is no surface to draw on.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        self.last_point = Some(self.clamp(point));
        true
    }

    /// Pen moved: adds a segment from the previous point. Ignored without a
    /// preceding `begin_stroke`.
    pub fn extend_stroke(&mut self, point: Point) -> Option<Segment> {
        let from = self.last_point?;
        let to = self.clamp(point);
        let seg = Segment {
            from,
            to,
            color: self.color,
            width: self.pen_width,
        };
        self.segments.push(seg);
        self.last_point = Some(to);
        Some(seg)
    }

    /// Pen up.
    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.last_point = None;
    }

    /// Paint all strokes onto a copy of `frame`. Without strokes the frame is
    /// returned as is (no pixel copy).
    pub fn render_onto(&self, frame: &FrameBuffer) -> FrameBuffer {
        if self.segments.is_empty() {
            return frame.clone();
        }
        // 1) Copy the frame's pixels; the source stays untouched.
        let mut canvas = Canvas {
            width: frame.width() as i32,
            height: frame.height() as i32,
            pixels: frame.as_bytes().to_vec(),
        };
        // 2) Replay every segment in drawing order, so later strokes sit on top.
        for seg in &self.segments {
            canvas.draw_thick_line(seg);
        }
        frame.with_data(canvas.pixels)
    }

    /// Out-of-bounds pointer positions are pinned to the nearest edge pixel.
    fn clamp(&self, p: Point) -> Point {
        let max_x = self.width.saturating_sub(1) as i32;
        let max_y = self.height.saturating_sub(1) as i32;
        Point::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
    }
}

/* ---------- Software drawing: pixels, discs, lines ---------- */

struct Canvas {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Put a pixel if (x, y) is inside bounds.
    #[inline]
    fn put_pixel(&mut self, x: i32, y: i32, c: Color) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[idx..idx + 3].copy_from_slice(&[c.r, c.g, c.b]);
    }

    /// Filled round dab of diameter `width` centered at (cx, cy).
    /// Visual: the pen tip, a solid dot in the stroke color.
    fn stamp(&mut self, cx: i32, cy: i32, width: u32, c: Color) {
        if width <= 1 {
            self.put_pixel(cx, cy, c);
            return;
        }
        // 1) Radius, never larger than the canvas itself.
        let r = width.min(MAX_PEN_WIDTH) as f32 / 2.0;
        let ri = (r.ceil() as i32).min(self.width.max(self.height));
        let r2 = r * r;
        // 2) Fill every pixel of the bounding square that falls inside the circle.
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if (dx * dx + dy * dy) as f32 <= r2 {
                    self.put_pixel(cx + dx, cy + dy, c);
                }
            }
        }
    }

    /// Bresenham walk from `from` to `to`, stamping the pen at every step.
    fn draw_thick_line(&mut self, seg: &Segment) {
        let (mut x0, mut y0) = (seg.from.x, seg.from.y);
        let (x1, y1) = (seg.to.x, seg.to.y);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            // Visual: one dab per step leaves a continuous thick line.
            self.stamp(x0, y0, seg.width, seg.color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(w: u32, h: u32) -> FrameBuffer {
        FrameBuffer::solid(w, h, Color::BLACK).unwrap()
    }

    #[test]
    fn extend_without_begin_is_ignored() {
        let mut o = DrawOverlay::new(10, 10);
        assert_eq!(o.extend_stroke(Point::new(3, 3)), None);
        assert!(o.is_empty());
    }

    #[test]
    fn extend_appends_segment_from_previous_point() {
        let mut o = DrawOverlay::new(10, 10);
        o.begin_stroke(Point::new(1, 1));
        o.extend_stroke(Point::new(4, 1));
        o.extend_stroke(Point::new(4, 6));
        let segs = o.segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].from, Point::new(1, 1));
        assert_eq!(segs[1].from, Point::new(4, 1));
        assert_eq!(segs[1].to, Point::new(4, 6));
        o.end_stroke();
        assert!(!o.is_drawing());
    }

    #[test]
    fn points_outside_are_clamped() {
        let mut o = DrawOverlay::new(10, 8);
        o.begin_stroke(Point::new(-5, 3));
        let seg = o.extend_stroke(Point::new(40, 100)).unwrap();
        assert_eq!(seg.from, Point::new(0, 3));
        assert_eq!(seg.to, Point::new(9, 7));
    }

    #[test]
    fn no_surface_means_no_stroke() {
        let mut o = DrawOverlay::default();
        assert!(!o.begin_stroke(Point::new(0, 0)));
        assert_eq!(o.extend_stroke(Point::new(1, 1)), None);
    }

    #[test]
    fn render_paints_copy_and_leaves_source_alone() {
        let src = black(10, 10);
        let mut o = DrawOverlay::new(10, 10);
        o.set_width(1);
        o.set_color(Color::WHITE);
        o.begin_stroke(Point::new(0, 5));
        o.extend_stroke(Point::new(9, 5));

        let out = o.render_onto(&src);
        for x in 0..10 {
            assert_eq!(out.pixel(x, 5), Some(Color::WHITE));
        }
        assert_eq!(out.pixel(0, 4), Some(Color::BLACK));
        assert!(src.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn thick_pen_covers_neighbours() {
        let mut o = DrawOverlay::new(20, 20);
        o.begin_stroke(Point::new(10, 10));
        o.extend_stroke(Point::new(10, 10));
        let out = o.render_onto(&black(20, 20));
        assert_eq!(out.pixel(10, 10), Some(Color::RED));
        assert_eq!(out.pixel(12, 10), Some(Color::RED));
        assert_eq!(out.pixel(10, 8), Some(Color::RED));
        assert_eq!(out.pixel(14, 10), Some(Color::BLACK));
    }

    #[test]
    fn pen_width_is_pinned_to_range() {
        let mut o = DrawOverlay::new(10, 10);
        assert_eq!(o.pen_width(), DEFAULT_PEN_WIDTH);
        o.set_width(0);
        assert_eq!(o.pen_width(), 1);
        o.set_width(u32::MAX);
        assert_eq!(o.pen_width(), MAX_PEN_WIDTH);
    }

    #[test]
    fn huge_pen_floods_small_frame() {
        let mut o = DrawOverlay::new(4, 4);
        o.set_width(70_000);
        o.begin_stroke(Point::new(1, 1));
        o.extend_stroke(Point::new(1, 1));
        let out = o.render_onto(&black(4, 4));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.pixel(x, y), Some(Color::RED));
            }
        }

        // Segments built by hand skip the setter.
        let mut canvas = Canvas {
            width: 3,
            height: 3,
            pixels: vec![0; 27],
        };
        canvas.stamp(1, 1, u32::MAX, Color::WHITE);
        assert!(canvas.pixels.iter().all(|&b| b == 255));
    }

    #[test]
    fn color_change_applies_to_later_segments_only() {
        let mut o = DrawOverlay::new(10, 10);
        assert_eq!(o.color(), Color::RED);
        o.begin_stroke(Point::new(0, 0));
        o.extend_stroke(Point::new(1, 0));
        o.set_color(Color::WHITE);
        o.extend_stroke(Point::new(2, 0));
        assert_eq!(o.segments()[0].color, Color::RED);
        assert_eq!(o.segments()[1].color, Color::WHITE);
    }

    #[test]
    fn resize_drops_strokes() {
        let mut o = DrawOverlay::new(10, 10);
        o.begin_stroke(Point::new(0, 0));
        o.extend_stroke(Point::new(5, 5));
        o.fit_to(10, 10);
        assert_eq!(o.segments().len(), 1);
        o.fit_to(20, 10);
        assert!(o.is_empty());
        assert_eq!(o.bounds(), (20, 10));
    }
}
