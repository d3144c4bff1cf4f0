//! Drawing surface for the sketch board
//!
//! Holds a fixed-size RGBA raster that freehand strokes are painted onto.
//! A [`Drawing`] is an immutable snapshot of that raster taken when the user
//! asks for an analysis.

mod color;

pub use color::Rgb;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Bytes per RGBA pixel
const CHANNELS: usize = 4;

/// Distance between disc stamps along a segment, in pixels
const STAMP_SPACING: f32 = 0.5;

/// Narrowest allowed stroke
pub const MIN_STROKE_WIDTH: u8 = 1;

/// Widest allowed stroke
pub const MAX_STROKE_WIDTH: u8 = 30;

/// Stroke width in pixels, always within `1..=30`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct StrokeWidth(u8);

impl StrokeWidth {
    /// Create a stroke width, clamping into the supported range
    #[must_use]
    pub fn new(px: u8) -> Self {
        Self(px.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH))
    }

    /// Width in pixels
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for StrokeWidth {
    fn default() -> Self {
        Self(5)
    }
}

impl From<u8> for StrokeWidth {
    fn from(px: u8) -> Self {
        Self::new(px)
    }
}

impl From<StrokeWidth> for u8 {
    fn from(width: StrokeWidth) -> Self {
        width.0
    }
}

/// A point on the canvas, in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A freehand polyline painted with a single width and color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub width: StrokeWidth,
    pub color: Rgb,
}

/// Immutable raster snapshot of the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Drawing {
    /// Wrap an RGBA buffer of `height × width × 4` bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidImage` if a dimension is zero or the buffer
    /// length does not match the dimensions
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "zero-sized drawing ({width}x{height})"
            )));
        }
        let expected = pixel_count(width, height) * CHANNELS;
        if rgba.len() != expected {
            return Err(Error::InvalidImage(format!(
                "buffer holds {} bytes, expected {expected} for {width}x{height} RGBA",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major
    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Consume the drawing, returning its raw buffer
    #[must_use]
    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }
}

/// Fixed-size paintable surface
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    background: Rgb,
    pixels: Vec<u8>,
    strokes: usize,
}

impl Canvas {
    /// Create a canvas filled with an opaque background
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidImage` if a dimension is zero
    pub fn new(width: u32, height: u32, background: Rgb) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "canvas must not be empty ({width}x{height})"
            )));
        }
        let pixels = background
            .to_rgba()
            .repeat(pixel_count(width, height));
        Ok(Self {
            width,
            height,
            background,
            pixels,
            strokes: 0,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn background(&self) -> Rgb {
        self.background
    }

    /// Number of strokes painted since the last clear
    #[must_use]
    pub const fn stroke_count(&self) -> usize {
        self.strokes
    }

    /// Paint a stroke onto the canvas
    ///
    /// Points outside the canvas are clipped. Returns whether any pixel was
    /// painted; a stroke that misses the canvas entirely is not counted.
    pub fn draw(&mut self, stroke: &Stroke) -> bool {
        let Some(first) = stroke.points.first() else {
            return false;
        };

        let radius = f32::from(stroke.width.get()) / 2.0;
        let color = stroke.color.to_rgba();

        let painted = if stroke.points.len() == 1 {
            self.stamp(*first, radius, color)
        } else {
            let mut painted = false;
            for segment in stroke.points.windows(2) {
                painted |= self.paint_segment(segment[0], segment[1], radius, color);
            }
            painted
        };

        if !painted {
            tracing::trace!(points = stroke.points.len(), "stroke missed the canvas");
            return false;
        }

        self.strokes += 1;
        tracing::trace!(
            points = stroke.points.len(),
            width = stroke.width.get(),
            color = %stroke.color,
            "stroke painted"
        );
        true
    }

    /// Restore the background everywhere
    pub fn clear(&mut self) {
        let bg = self.background.to_rgba();
        for px in self.pixels.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&bg);
        }
        self.strokes = 0;
    }

    /// Whether every pixel still equals the background
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let bg = self.background.to_rgba();
        self.pixels.chunks_exact(CHANNELS).all(|px| *px == bg)
    }

    /// Snapshot the current raster
    ///
    /// Returns `None` for a blank canvas, so nothing is ever sent for analysis
    /// without at least one painted pixel.
    #[must_use]
    pub fn capture(&self) -> Option<Drawing> {
        if self.is_blank() {
            return None;
        }
        Some(Drawing {
            width: self.width,
            height: self.height,
            rgba: self.pixels.clone(),
        })
    }

    /// RGBA value at a pixel, if inside the canvas
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + CHANNELS]);
        Some(out)
    }

    fn paint_segment(&mut self, from: Point, to: Point, radius: f32, color: [u8; 4]) -> bool {
        let Some((from, to)) = self.clip_segment(from, to, radius) else {
            return false;
        };

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = dx.hypot(dy);

        // Clipped length is bounded by the canvas diagonal
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = ((length / STAMP_SPACING).ceil() as u32).max(1);

        let mut painted = false;
        for i in 0..=steps {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / steps as f32;
            painted |= self.stamp(
                Point::new(dx.mul_add(t, from.x), dy.mul_add(t, from.y)),
                radius,
                color,
            );
        }
        painted
    }

    /// Cut a segment down to the part that can reach the canvas
    ///
    /// Liang-Barsky against the canvas grown by the stroke radius, computed in
    /// `f64` so far-off endpoints keep pixel precision. `None` when the
    /// segment cannot touch the canvas.
    #[allow(clippy::cast_possible_truncation)]
    fn clip_segment(&self, from: Point, to: Point, radius: f32) -> Option<(Point, Point)> {
        let coords = [from.x, from.y, to.x, to.y];
        if !coords.iter().all(|v| v.is_finite()) {
            return None;
        }

        let margin = f64::from(radius) + 1.0;
        let (x0, y0) = (f64::from(from.x), f64::from(from.y));
        let dx = f64::from(to.x) - x0;
        let dy = f64::from(to.y) - y0;
        let max_x = f64::from(self.width) + margin;
        let max_y = f64::from(self.height) + margin;

        let mut t_enter = 0.0_f64;
        let mut t_exit = 1.0_f64;
        for (p, q) in [
            (-dx, x0 + margin),
            (dx, max_x - x0),
            (-dy, y0 + margin),
            (dy, max_y - y0),
        ] {
            if p.abs() < f64::EPSILON {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t_enter = t_enter.max(r);
            } else {
                t_exit = t_exit.min(r);
            }
            if t_enter > t_exit {
                return None;
            }
        }

        let at = |t: f64| Point::new(dx.mul_add(t, x0) as f32, dy.mul_add(t, y0) as f32);
        Some((at(t_enter), at(t_exit)))
    }

    /// Fill a disc centred on `center`; the pixel containing the centre is
    /// always painted so hairline strokes stay visible
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    fn stamp(&mut self, center: Point, radius: f32, color: [u8; 4]) -> bool {
        if !center.x.is_finite() || !center.y.is_finite() {
            return false;
        }

        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;

        let x0 = ((center.x - radius).floor() as i64).max(0);
        let x1 = ((center.x + radius).ceil() as i64).min(max_x);
        let y0 = ((center.y - radius).floor() as i64).max(0);
        let y1 = ((center.y + radius).ceil() as i64).min(max_y);

        let mut painted = false;
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let px = x as f32 + 0.5 - center.x;
                let py = y as f32 + 0.5 - center.y;
                if px.mul_add(px, py * py) <= r2 {
                    self.put(x as u32, y as u32, color);
                    painted = true;
                }
            }
        }

        let cx = center.x.floor() as i64;
        let cy = center.y.floor() as i64;
        if (0..=max_x).contains(&cx) && (0..=max_y).contains(&cy) {
            self.put(cx as u32, cy as u32, color);
            painted = true;
        }
        painted
    }

    fn put(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + CHANNELS].copy_from_slice(&color);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

const fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f32, f32)], width: u8) -> Stroke {
        Stroke {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            width: StrokeWidth::new(width),
            color: Rgb::BLACK,
        }
    }

    #[test]
    fn test_new_canvas_is_blank() {
        let canvas = Canvas::new(40, 30, Rgb::WHITE).unwrap();
        assert!(canvas.is_blank());
        assert!(canvas.capture().is_none());
        assert_eq!(canvas.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(40, 0), None);
    }

    #[test]
    fn test_zero_sized_canvas_rejected() {
        assert!(matches!(
            Canvas::new(0, 10, Rgb::WHITE),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_stroke_paints_pixels() {
        let mut canvas = Canvas::new(40, 30, Rgb::WHITE).unwrap();
        canvas.draw(&line(&[(5.0, 5.0), (30.0, 5.0)], 3));

        assert!(!canvas.is_blank());
        assert_eq!(canvas.stroke_count(), 1);
        assert_eq!(canvas.pixel(15, 5), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(15, 20), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_hairline_point_is_visible() {
        let mut canvas = Canvas::new(10, 10, Rgb::WHITE).unwrap();
        canvas.draw(&line(&[(4.0, 4.0)], 1));
        assert_eq!(canvas.pixel(4, 4), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_strokes_outside_are_clipped() {
        let mut canvas = Canvas::new(10, 10, Rgb::WHITE).unwrap();
        assert!(!canvas.draw(&line(&[(-50.0, -50.0), (-20.0, -20.0)], 5)));
        assert!(canvas.is_blank());
        assert_eq!(canvas.stroke_count(), 0);

        canvas.draw(&line(&[(-5.0, 5.0), (15.0, 5.0)], 1));
        assert_eq!(canvas.pixel(0, 5), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(9, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_far_endpoint_paints_visible_part() {
        for far in [1e5, 1e7, f32::MAX] {
            let mut canvas = Canvas::new(400, 300, Rgb::WHITE).unwrap();
            assert!(canvas.draw(&line(&[(10.0, 150.0), (far, 150.0)], 5)));
            for x in 10..400 {
                assert_eq!(canvas.pixel(x, 150), Some([0, 0, 0, 255]), "x={x} far={far}");
            }

            let mut canvas = Canvas::new(400, 300, Rgb::WHITE).unwrap();
            canvas.draw(&line(&[(-far, 20.0), (390.0, 20.0)], 3));
            for x in 0..390 {
                assert_eq!(canvas.pixel(x, 20), Some([0, 0, 0, 255]), "x={x} far={far}");
            }
        }
    }

    #[test]
    fn test_diagonal_through_canvas_from_far_away() {
        let mut canvas = Canvas::new(100, 100, Rgb::WHITE).unwrap();
        canvas.draw(&line(&[(-1e6, -1e6), (1e6, 1e6)], 3));
        for i in 0..100 {
            assert_eq!(canvas.pixel(i, i), Some([0, 0, 0, 255]), "i={i}");
        }
    }

    #[test]
    fn test_empty_stroke_ignored() {
        let mut canvas = Canvas::new(10, 10, Rgb::WHITE).unwrap();
        assert!(!canvas.draw(&line(&[], 5)));
        assert!(canvas.is_blank());
        assert_eq!(canvas.stroke_count(), 0);
    }

    #[test]
    fn test_clear_restores_background() {
        let mut canvas = Canvas::new(20, 20, Rgb::WHITE).unwrap();
        canvas.draw(&line(&[(2.0, 2.0), (18.0, 18.0)], 4));
        assert!(canvas.capture().is_some());

        canvas.clear();
        assert!(canvas.is_blank());
        assert_eq!(canvas.stroke_count(), 0);
    }

    #[test]
    fn test_capture_is_a_snapshot() {
        let mut canvas = Canvas::new(20, 20, Rgb::WHITE).unwrap();
        canvas.draw(&line(&[(2.0, 2.0)], 2));
        let drawing = canvas.capture().unwrap();

        canvas.draw(&line(&[(15.0, 15.0)], 2));
        assert_ne!(drawing.rgba(), canvas.capture().unwrap().rgba());
        assert_eq!(drawing.width(), 20);
        assert_eq!(drawing.rgba().len(), 20 * 20 * 4);
    }

    #[test]
    fn test_stroke_width_clamped() {
        assert_eq!(StrokeWidth::new(0).get(), 1);
        assert_eq!(StrokeWidth::new(45).get(), 30);
        assert_eq!(StrokeWidth::new(12).get(), 12);

        let width: StrokeWidth = serde_json::from_str("99").unwrap();
        assert_eq!(width.get(), 30);
    }

    #[test]
    fn test_drawing_dimension_checks() {
        assert!(Drawing::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Drawing::from_rgba(2, 2, vec![0; 15]),
            Err(Error::InvalidImage(_))
        ));
        assert!(Drawing::from_rgba(0, 2, Vec::new()).is_err());
    }
}
