//! CPU rasterizer over an `RgbaImage`.
//!
//! Strokes are drawn by distance-to-outline coverage: each pixel center near
//! the geometry gets `clamp(half_width + 0.5 - distance, 0, 1)`, which gives
//! anti-aliased edges and round caps for free. A stroke accumulates coverage
//! into a mask first (max per pixel) and composites once, so joins and
//! overlapping segments don't double-blend.

use ic_core::Color;
use image::{Rgba, RgbaImage};
use kurbo::{Point, Rect, Vec2};
use std::f64::consts::TAU;

/// Dash pattern for selection and in-progress outlines: 6px on, 4px off.
pub const DEFAULT_DASH: Dash = Dash { on: 6.0, off: 4.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    #[default]
    SourceOver,
    /// Erase: destination alpha is reduced by source coverage.
    DestinationOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f64,
    pub off: f64,
}

impl Dash {
    fn visible(&self, arc_pos: f64) -> bool {
        let period = self.on + self.off;
        period <= 0.0 || arc_pos.rem_euclid(period) < self.on
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub dash: Option<Dash>,
    pub composite: Composite,
}

impl StrokeStyle {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
            composite: Composite::SourceOver,
        }
    }

    pub fn dashed(color: Color, width: f64) -> Self {
        Self {
            dash: Some(DEFAULT_DASH),
            ..Self::solid(color, width)
        }
    }
}

// ─── Coverage mask ───────────────────────────────────────────────────────

/// Per-pixel coverage over a clipped pixel window of the target.
struct Mask {
    x0: u32,
    y0: u32,
    w: u32,
    h: u32,
    data: Vec<f32>,
}

impl Mask {
    fn add(&mut self, x: u32, y: u32, c: f32) {
        let i = ((y - self.y0) * self.w + (x - self.x0)) as usize;
        if c > self.data[i] {
            self.data[i] = c;
        }
    }
}

// ─── Painter ─────────────────────────────────────────────────────────────

/// Draws canvas-space geometry into a pixel buffer.
///
/// `offset` is the canvas coordinate of the buffer's top-left pixel, so a
/// cropped export can reuse the same drawing code as the full canvas.
pub struct Painter<'a> {
    target: &'a mut RgbaImage,
    offset: Vec2,
}

impl<'a> Painter<'a> {
    pub fn new(target: &'a mut RgbaImage) -> Self {
        Self::with_offset(target, Vec2::ZERO)
    }

    pub fn with_offset(target: &'a mut RgbaImage, offset: Vec2) -> Self {
        Self { target, offset }
    }

    pub fn width(&self) -> u32 {
        self.target.width()
    }

    pub fn height(&self) -> u32 {
        self.target.height()
    }

    /// Fill every pixel with `color`, replacing whatever was there.
    pub fn clear(&mut self, color: Color) {
        let px = Rgba(color.to_array());
        for p in self.target.pixels_mut() {
            *p = px;
        }
    }

    /// Canvas-space center of pixel `(x, y)`.
    fn pixel_center(&self, x: u32, y: u32) -> Point {
        Point::new(x as f64 + 0.5 + self.offset.x, y as f64 + 0.5 + self.offset.y)
    }

    /// Pixel window covering a canvas-space rect, clipped to the target.
    fn window(&self, r: Rect) -> Option<Mask> {
        let r = r - self.offset;
        let x0 = r.x0.floor().max(0.0);
        let y0 = r.y0.floor().max(0.0);
        let x1 = r.x1.ceil().min(self.target.width() as f64);
        let y1 = r.y1.ceil().min(self.target.height() as f64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);
        Some(Mask {
            x0: x0 as u32,
            y0: y0 as u32,
            w,
            h,
            data: vec![0.0; (w * h) as usize],
        })
    }

    fn composite_mask(&mut self, mask: &Mask, color: Color, composite: Composite) {
        for dy in 0..mask.h {
            for dx in 0..mask.w {
                let c = mask.data[(dy * mask.w + dx) as usize];
                if c > 0.0 {
                    let p = self.target.get_pixel_mut(mask.x0 + dx, mask.y0 + dy);
                    blend(p, color, c, composite);
                }
            }
        }
    }

    // ─── Strokes ─────────────────────────────────────────────────────────

    pub fn stroke_segment(&mut self, a: Point, b: Point, style: &StrokeStyle) {
        self.stroke_polyline(&[a, b], false, style);
    }

    /// Stroke connected segments. The dash pattern runs continuously along
    /// the whole path.
    pub fn stroke_polyline(&mut self, points: &[Point], closed: bool, style: &StrokeStyle) {
        if points.is_empty() || style.width <= 0.0 {
            return;
        }
        let half = style.width / 2.0;
        let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if closed && points.len() > 2 {
            segments.push((points[points.len() - 1], points[0]));
        }
        if segments.is_empty() {
            segments.push((points[0], points[0]));
        }

        let bounds = points
            .iter()
            .fold(Rect::from_points(points[0], points[0]), |acc, p| acc.union_pt(*p))
            .inflate(half + 1.0, half + 1.0);
        let Some(mut mask) = self.window(bounds) else {
            return;
        };

        let mut arc_start = 0.0;
        for (a, b) in segments {
            let seg_len = (b - a).hypot();
            let seg_bounds = Rect::from_points(a, b).inflate(half + 1.0, half + 1.0);
            if let Some(win) = self.window(seg_bounds) {
                for y in win.y0..win.y0 + win.h {
                    for x in win.x0..win.x0 + win.w {
                        let p = self.pixel_center(x, y);
                        let (dist, t) = project(p, a, b);
                        if let Some(dash) = style.dash
                            && !dash.visible(arc_start + t * seg_len)
                        {
                            continue;
                        }
                        let c = coverage(half, dist);
                        if c > 0.0 {
                            mask.add(x, y, c);
                        }
                    }
                }
            }
            arc_start += seg_len;
        }
        self.composite_mask(&mask, style.color, style.composite);
    }

    pub fn stroke_rect(&mut self, r: Rect, style: &StrokeStyle) {
        let corners = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ];
        self.stroke_polyline(&corners, true, style);
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f64, style: &StrokeStyle) {
        if style.width <= 0.0 {
            return;
        }
        let half = style.width / 2.0;
        let reach = radius + half + 1.0;
        let Some(mut mask) = self.window(Rect::from_center_size(center, (reach * 2.0, reach * 2.0))) else {
            return;
        };
        for y in mask.y0..mask.y0 + mask.h {
            for x in mask.x0..mask.x0 + mask.w {
                let v = self.pixel_center(x, y) - center;
                let dist = (v.hypot() - radius).abs();
                if let Some(dash) = style.dash {
                    let angle = v.y.atan2(v.x).rem_euclid(TAU);
                    if !dash.visible(angle * radius) {
                        continue;
                    }
                }
                let c = coverage(half, dist);
                if c > 0.0 {
                    mask.add(x, y, c);
                }
            }
        }
        self.composite_mask(&mask, style.color, style.composite);
    }

    /// Filled disc, used for pen-down dots.
    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Color, composite: Composite) {
        let reach = radius + 1.0;
        let Some(mut mask) = self.window(Rect::from_center_size(center, (reach * 2.0, reach * 2.0))) else {
            return;
        };
        for y in mask.y0..mask.y0 + mask.h {
            for x in mask.x0..mask.x0 + mask.w {
                let dist = (self.pixel_center(x, y) - center).hypot();
                let c = (radius + 0.5 - dist).clamp(0.0, 1.0) as f32;
                if c > 0.0 {
                    mask.add(x, y, c);
                }
            }
        }
        self.composite_mask(&mask, color, composite);
    }

    /// Solid axis-aligned fill with pixel-center sampling.
    pub fn fill_rect(&mut self, r: Rect, color: Color) {
        let Some(win) = self.window(r) else {
            return;
        };
        for y in win.y0..win.y0 + win.h {
            for x in win.x0..win.x0 + win.w {
                let p = self.pixel_center(x, y);
                if p.x >= r.x0 && p.x < r.x1 && p.y >= r.y0 && p.y < r.y1 {
                    blend(self.target.get_pixel_mut(x, y), color, 1.0, Composite::SourceOver);
                }
            }
        }
    }

    // ─── Bitmaps ─────────────────────────────────────────────────────────

    /// Draw `src` scaled into the canvas-space rect `dest` (nearest sample).
    pub fn blit(&mut self, src: &RgbaImage, dest: Rect) {
        let dest = dest.abs();
        if src.width() == 0 || src.height() == 0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let Some(win) = self.window(dest) else {
            return;
        };
        let sx = src.width() as f64 / dest.width();
        let sy = src.height() as f64 / dest.height();
        for y in win.y0..win.y0 + win.h {
            for x in win.x0..win.x0 + win.w {
                let p = self.pixel_center(x, y);
                if p.x < dest.x0 || p.x >= dest.x1 || p.y < dest.y0 || p.y >= dest.y1 {
                    continue;
                }
                let u = (((p.x - dest.x0) * sx) as u32).min(src.width() - 1);
                let v = (((p.y - dest.y0) * sy) as u32).min(src.height() - 1);
                let Rgba([r, g, b, a]) = *src.get_pixel(u, v);
                if a > 0 {
                    blend(self.target.get_pixel_mut(x, y), Color::rgba(r, g, b, a), 1.0, Composite::SourceOver);
                }
            }
        }
    }

    /// Composite a canvas-sized layer (e.g. ink) whose pixel `(0, 0)` sits at
    /// canvas origin.
    pub fn draw_layer(&mut self, layer: &RgbaImage) {
        let ox = self.offset.x.round() as i64;
        let oy = self.offset.y.round() as i64;
        for y in 0..self.target.height() {
            let ly = y as i64 + oy;
            if ly < 0 || ly >= layer.height() as i64 {
                continue;
            }
            for x in 0..self.target.width() {
                let lx = x as i64 + ox;
                if lx < 0 || lx >= layer.width() as i64 {
                    continue;
                }
                let Rgba([r, g, b, a]) = *layer.get_pixel(lx as u32, ly as u32);
                if a > 0 {
                    blend(self.target.get_pixel_mut(x, y), Color::rgba(r, g, b, a), 1.0, Composite::SourceOver);
                }
            }
        }
    }

    /// Fill a glyph coverage mask whose top-left pixel lands at canvas
    /// `(left, top)`.
    pub fn fill_mask(&mut self, left: f64, top: f64, width: usize, height: usize, coverage: &[u8], color: Color) {
        let origin = Point::new(left, top) - self.offset;
        let (ox, oy) = (origin.x.round() as i64, origin.y.round() as i64);
        for row in 0..height {
            let ty = oy + row as i64;
            if ty < 0 || ty >= self.target.height() as i64 {
                continue;
            }
            for col in 0..width {
                let tx = ox + col as i64;
                if tx < 0 || tx >= self.target.width() as i64 {
                    continue;
                }
                let c = coverage.get(row * width + col).copied().unwrap_or(0);
                if c > 0 {
                    let p = self.target.get_pixel_mut(tx as u32, ty as u32);
                    blend(p, color, c as f32 / 255.0, Composite::SourceOver);
                }
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn coverage(half_width: f64, dist: f64) -> f32 {
    (half_width + 0.5 - dist).clamp(0.0, 1.0) as f32
}

/// Distance from `p` to segment `a..b` and the clamped parameter of the
/// nearest point.
fn project(p: Point, a: Point, b: Point) -> (f64, f64) {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return ((p - a).hypot(), 0.0);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    ((p - (a + ab * t)).hypot(), t)
}

/// Straight-alpha compositing of `color` at `cov` coverage onto `dst`.
fn blend(dst: &mut Rgba<u8>, color: Color, cov: f32, composite: Composite) {
    let sa = color.a as f32 / 255.0 * cov;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    match composite {
        Composite::SourceOver => {
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                *dst = Rgba([0, 0, 0, 0]);
                return;
            }
            let src = [color.r, color.g, color.b];
            for (i, s) in src.iter().enumerate() {
                let d = dst.0[i] as f32;
                let v = (*s as f32 * sa + d * da * (1.0 - sa)) / out_a;
                dst.0[i] = v.round().clamp(0.0, 255.0) as u8;
            }
            dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        Composite::DestinationOut => {
            let out_a = da * (1.0 - sa);
            dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
            if dst.0[3] == 0 {
                *dst = Rgba([0, 0, 0, 0]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn solid_segment_covers_its_pixels() {
        let mut img = RgbaImage::new(20, 20);
        Painter::new(&mut img).stroke_segment(
            Point::new(2.0, 10.0),
            Point::new(18.0, 10.0),
            &StrokeStyle::solid(Color::BLACK, 4.0),
        );
        assert_eq!(img.get_pixel(10, 9).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(10, 15).0[3], 0);
    }

    #[test]
    fn dashed_rect_has_gaps() {
        let mut img = RgbaImage::new(60, 60);
        Painter::new(&mut img).stroke_rect(Rect::new(5.0, 5.0, 55.0, 55.0), &StrokeStyle::dashed(Color::BLACK, 1.0));
        let top_row: Vec<u8> = (5..55).map(|x| img.get_pixel(x, 5).0[3]).collect();
        assert!(top_row.iter().any(|&a| a > 0));
        assert!(top_row.iter().any(|&a| a == 0));
    }

    #[test]
    fn destination_out_clears_alpha() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let mut painter = Painter::new(&mut img);
        painter.fill_circle(Point::new(5.0, 5.0), 3.0, Color::BLACK, Composite::DestinationOut);
        assert_eq!(img.get_pixel(5, 5).0[3], 0);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn offset_shifts_drawing() {
        let mut img = RgbaImage::new(10, 10);
        Painter::with_offset(&mut img, Vec2::new(100.0, 100.0)).fill_rect(Rect::new(100.0, 100.0, 102.0, 102.0), Color::BLACK);
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
        assert_eq!(img.get_pixel(1, 1).0[3], 255);
        assert_eq!(img.get_pixel(2, 2).0[3], 0);
    }

    #[test]
    fn blit_scales_source() {
        let src = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
        let mut img = RgbaImage::new(20, 20);
        Painter::new(&mut img).blit(&src, Rect::new(4.0, 4.0, 12.0, 12.0));
        assert_eq!(img.get_pixel(4, 4).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(11, 11).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(12, 12).0[3], 0);
    }

    #[test]
    fn source_over_on_transparent_keeps_color() {
        let mut px = Rgba([0, 0, 0, 0]);
        blend(&mut px, Color::rgba(200, 100, 50, 255), 0.5, Composite::SourceOver);
        assert_eq!(px.0, [200, 100, 50, 128]);
    }
}
