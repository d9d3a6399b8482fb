use image::{Rgba, RgbaImage};
use kurbo::Rect;
use std::sync::Arc;

/// Full-canvas raster of freehand pen and eraser ink.
///
/// Ink is not object-like: it can't be selected, moved or hit-tested. The
/// pixels live behind an `Arc`, so cloning a scene for a history snapshot
/// shares the buffer until the next stroke writes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct InkLayer {
    pixels: Arc<RgbaImage>,
}

impl InkLayer {
    /// A fully transparent layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: Arc::new(RgbaImage::new(width, height)),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Mutable access to the pixels, detaching from any shared snapshot.
    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        Arc::make_mut(&mut self.pixels)
    }

    /// Whether this layer and `other` share one buffer (no copy made yet).
    pub fn shares_pixels_with(&self, other: &InkLayer) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == 0)
    }

    pub fn clear(&mut self) {
        if self.is_blank() {
            return;
        }
        let (w, h) = (self.width(), self.height());
        self.pixels = Arc::new(RgbaImage::new(w, h));
    }

    /// Tight bounds of every pixel with non-zero alpha, in canvas units.
    pub fn content_bounds(&self) -> Option<Rect> {
        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut any = false;
        for (x, y, Rgba([_, _, _, a])) in self.pixels.enumerate_pixels() {
            if *a == 0 {
                continue;
            }
            any = true;
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
        any.then(|| Rect::new(min.0 as f64, min.1 as f64, (max.0 + 1) as f64, (max.1 + 1) as f64))
    }
}
