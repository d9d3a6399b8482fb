//! Text metrics and glyph drawing.
//!
//! With a loaded `fontdue` font, glyphs are rasterized to coverage masks and
//! measured by their advance widths. Without one, the book falls back to the
//! fixed-advance metrics of [`ApproxMeasure`] and draws each visible
//! character as a solid block, which keeps rendering deterministic on hosts
//! with no font files.
//!
//! One font file serves every family name: `FontSpec::family` is carried in
//! the model but not consulted here. Bold is drawn as a doubled pass and
//! italic as a horizontal shear of the upright glyphs.

use crate::error::FontError;
use crate::raster::Painter;
use ic_core::geometry::{ApproxMeasure, TextMeasure};
use ic_core::{Color, FontSpec, FontWeight};
use kurbo::{Point, Rect};
use std::path::Path;

pub struct FontBook {
    font: Option<fontdue::Font>,
}

impl FontBook {
    /// Fallback metrics only.
    pub fn fallback() -> Self {
        Self { font: None }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn from_path(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path)?;
        let book = Self::from_bytes(&bytes)?;
        log::debug!("loaded font {}", path.display());
        Ok(book)
    }

    /// Load `path` if given, falling back (with a warning) when it can't be
    /// read or parsed.
    pub fn load_or_fallback(path: Option<&Path>) -> Self {
        match path.map(Self::from_path) {
            Some(Ok(book)) => book,
            Some(Err(e)) => {
                log::warn!("font unavailable, using fallback metrics: {e}");
                Self::fallback()
            }
            None => Self::fallback(),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw a single line of text with its box's top-left at `origin`.
    pub fn draw_text(&self, painter: &mut Painter<'_>, text: &str, origin: Point, font: &FontSpec<'_>, color: Color) {
        match &self.font {
            Some(f) => draw_glyphs(f, painter, text, origin, font, color),
            None => draw_blocks(painter, text, origin, font, color),
        }
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::fallback()
    }
}

impl TextMeasure for FontBook {
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f64 {
        let Some(f) = &self.font else {
            return ApproxMeasure.text_width(text, font);
        };
        let px = font.size as f32;
        let advance: f32 = text.chars().map(|c| f.metrics(c, px).advance_width).sum();
        let mut width = advance as f64;
        if font.weight == FontWeight::Bold && !text.is_empty() {
            width += faux_bold_offset(font.size);
        }
        width
    }
}

fn faux_bold_offset(size: f64) -> f64 {
    (size / 24.0).max(1.0)
}

/// Horizontal shift per pixel of height for faux italics.
const ITALIC_SLANT: f64 = 0.15;

fn slant(font: &FontSpec<'_>) -> f64 {
    if font.weight == FontWeight::Italic { ITALIC_SLANT } else { 0.0 }
}

fn draw_glyphs(f: &fontdue::Font, painter: &mut Painter<'_>, text: &str, origin: Point, font: &FontSpec<'_>, color: Color) {
    let px = font.size as f32;
    let ascent = f
        .horizontal_line_metrics(px)
        .map(|m| m.ascent as f64)
        .unwrap_or(font.size * 0.8);
    let baseline = origin.y + ascent;
    let passes: &[f64] = if font.weight == FontWeight::Bold {
        &[0.0, faux_bold_offset(font.size)]
    } else {
        &[0.0]
    };

    let slant = slant(font);

    let mut pen_x = origin.x;
    for c in text.chars() {
        let (metrics, bitmap) = f.rasterize(c, px);
        if metrics.width > 0 && metrics.height > 0 {
            let left = pen_x + metrics.xmin as f64;
            let top = baseline - (metrics.height as i32 + metrics.ymin) as f64;
            if slant == 0.0 {
                for dx in passes {
                    painter.fill_mask(left + dx, top, metrics.width, metrics.height, &bitmap, color);
                }
            } else {
                // Rows above the baseline lean right, descenders lean left.
                for (row, coverage) in bitmap.chunks(metrics.width).enumerate() {
                    let y = top + row as f64;
                    let shear = (baseline - y) * slant;
                    for dx in passes {
                        painter.fill_mask(left + dx + shear, y, metrics.width, 1, coverage, color);
                    }
                }
            }
        }
        pen_x += metrics.advance_width as f64;
    }
}

fn draw_blocks(painter: &mut Painter<'_>, text: &str, origin: Point, font: &FontSpec<'_>, color: Color) {
    let advance = ApproxMeasure::advance(font);
    let top = origin.y + font.size * 0.2;
    let bottom = origin.y + font.size * 0.9;
    let slant = slant(font);
    let middle = (top + bottom) / 2.0;
    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            continue;
        }
        let left = origin.x + i as f64 * advance;
        let (x0, x1) = (left + advance * 0.1, left + advance * 0.9);
        if slant == 0.0 {
            painter.fill_rect(Rect::new(x0, top, x1, bottom), color);
            continue;
        }
        // Sheared about the middle row so the block stays inside its advance.
        let mut y = top;
        while y < bottom {
            let next = (y.floor() + 1.0).min(bottom);
            let shear = (middle - (y + next) / 2.0) * slant;
            painter.fill_rect(Rect::new(x0 + shear, y, x1 + shear, next), color);
            y = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn spec(size: f64, weight: FontWeight) -> FontSpec<'static> {
        FontSpec {
            family: "sans",
            size,
            weight,
        }
    }

    #[test]
    fn fallback_measures_fixed_advance() {
        let book = FontBook::fallback();
        assert_eq!(book.text_width("", &spec(20.0, FontWeight::Normal)), 0.0);
        let w = book.text_width("hello", &spec(20.0, FontWeight::Normal));
        assert!((w - 55.0).abs() < 1e-9);
        let bold = book.text_width("hello", &spec(20.0, FontWeight::Bold));
        assert!(bold > w);
    }

    #[test]
    fn fallback_blocks_stay_inside_measured_box() {
        let book = FontBook::fallback();
        let font = spec(20.0, FontWeight::Normal);
        let mut img = RgbaImage::new(100, 40);
        book.draw_text(&mut Painter::new(&mut img), "abc", Point::new(10.0, 5.0), &font, Color::BLACK);
        let width = book.text_width("abc", &font);
        for (x, y, p) in img.enumerate_pixels() {
            if p.0[3] > 0 {
                assert!((x as f64) >= 10.0 && (x as f64) < 10.0 + width, "x={x} outside box");
                assert!((y as f64) >= 5.0 && (y as f64) < 25.0, "y={y} outside box");
            }
        }
        assert!(img.pixels().any(|p| p.0[3] > 0), "nothing drawn");
    }

    #[test]
    fn italic_blocks_lean_right_and_stay_in_the_box() {
        let book = FontBook::fallback();
        let font = spec(40.0, FontWeight::Italic);
        let mut img = RgbaImage::new(120, 60);
        book.draw_text(&mut Painter::new(&mut img), "ab", Point::new(10.0, 5.0), &font, Color::BLACK);

        let width = book.text_width("ab", &font);
        let leftmost = |y: u32| (0..img.width()).find(|&x| img.get_pixel(x, y).0[3] > 0);
        for (x, y, p) in img.enumerate_pixels() {
            if p.0[3] > 0 {
                assert!((x as f64) >= 10.0 && (x as f64) < 10.0 + width, "x={x} outside box");
            }
        }
        // Block rows span y = 13..41 for a 40px font at y = 5.
        let (top, bottom) = (leftmost(14).unwrap(), leftmost(40).unwrap());
        assert!(top > bottom, "italic top row starts at {top}, bottom at {bottom}");

        let mut upright = RgbaImage::new(120, 60);
        let normal = spec(40.0, FontWeight::Normal);
        book.draw_text(&mut Painter::new(&mut upright), "ab", Point::new(10.0, 5.0), &normal, Color::BLACK);
        assert_ne!(img, upright);
    }

    #[test]
    fn bad_font_bytes_fail() {
        assert!(FontBook::from_bytes(b"not a font").is_err());
        let book = FontBook::load_or_fallback(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!book.has_font());
    }
}
