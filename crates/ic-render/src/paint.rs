//! Scene → pixels.
//!
//! One frame is, in order: clear, background, ink layer, committed objects
//! in draw order, the in-progress object (dashed), then the selection box
//! (dashed, accent color). Rendering never mutates the scene and the same
//! inputs always produce the same pixels.

use crate::assets::AssetCache;
use crate::font::FontBook;
use crate::raster::{Painter, StrokeStyle};
use ic_core::geometry::Outline;
use ic_core::{Color, Drawable, ObjectId, Scene, ShapeKind};
use image::RgbaImage;
use kurbo::{Rect, Vec2};

/// Width of the selection outline.
const SELECTION_STROKE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Opaque(Color),
    Transparent,
}

impl Background {
    pub fn from_config(color: Color, transparent: bool) -> Self {
        if transparent {
            Background::Transparent
        } else {
            Background::Opaque(color)
        }
    }

    pub fn color(self) -> Color {
        match self {
            Background::Opaque(c) => c,
            Background::Transparent => Color::TRANSPARENT,
        }
    }
}

/// Transient interaction overlays for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameState<'a> {
    pub in_progress: Option<&'a Drawable>,
    pub selected: Option<ObjectId>,
    pub selection_margin: f64,
}

impl FrameState<'_> {
    /// No overlays: what export draws.
    pub fn committed_only() -> Self {
        Self::default()
    }
}

pub struct Renderer {
    fonts: FontBook,
}

impl Renderer {
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }

    /// The text measurer shared with hit-testing and export.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Render the whole canvas into a new buffer sized like the ink layer.
    pub fn render(&self, scene: &Scene, assets: &AssetCache, background: Background, frame: &FrameState<'_>) -> RgbaImage {
        let ink = scene.ink();
        let mut target = RgbaImage::new(ink.width(), ink.height());
        self.render_into(&mut target, Vec2::ZERO, scene, assets, background, frame);
        target
    }

    /// Render into `target`, whose top-left pixel is canvas point `offset`.
    pub fn render_into(
        &self,
        target: &mut RgbaImage,
        offset: Vec2,
        scene: &Scene,
        assets: &AssetCache,
        background: Background,
        frame: &FrameState<'_>,
    ) {
        log::trace!(
            "frame {}x{} at {offset:?}: {} objects",
            target.width(),
            target.height(),
            scene.len()
        );
        let mut painter = Painter::with_offset(target, offset);

        painter.clear(Color::TRANSPARENT);
        if let Background::Opaque(c) = background {
            painter.clear(c);
        }

        painter.draw_layer(scene.ink().image());

        for obj in scene.draw_order() {
            self.draw_object(&mut painter, obj, assets, false);
        }

        if let Some(obj) = frame.in_progress {
            self.draw_object(&mut painter, obj, assets, true);
        }

        if let Some(id) = frame.selected
            && let Some(obj) = scene.get(id)
        {
            let bounds = self.selection_bounds(obj, frame.selection_margin);
            painter.stroke_rect(bounds, &StrokeStyle::dashed(Color::ACCENT, SELECTION_STROKE));
        }
    }

    /// Outline bounds grown by the stroke and `margin` on every side.
    pub fn selection_bounds(&self, obj: &Drawable, margin: f64) -> Rect {
        Outline::of(obj, &self.fonts).painted_bounds().inflate(margin, margin)
    }

    fn draw_object(&self, painter: &mut Painter<'_>, obj: &Drawable, assets: &AssetCache, dashed: bool) {
        match obj {
            Drawable::Shape(s) => {
                let style = if dashed {
                    StrokeStyle::dashed(s.stroke_color, s.stroke_width)
                } else {
                    StrokeStyle::solid(s.stroke_color, s.stroke_width)
                };
                match s.kind {
                    ShapeKind::Rectangle => painter.stroke_rect(Rect::from_points(s.anchor(), s.end()), &style),
                    ShapeKind::Circle => painter.stroke_circle(s.circle_center(), s.circle_radius(), &style),
                    ShapeKind::Line => painter.stroke_segment(s.anchor(), s.end(), &style),
                }
            }
            Drawable::Text(t) => {
                if !t.text.is_empty() {
                    self.fonts.draw_text(painter, &t.text, obj.origin(), &t.font(), t.color);
                }
            }
            Drawable::Image(i) => match assets.get(&i.image_url) {
                Some(bitmap) => painter.blit(bitmap, Rect::from_points((i.x, i.y), (i.x + i.w, i.y + i.h))),
                None => log::trace!("image {} not loaded, skipping", i.id),
            },
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(FontBook::fallback())
    }
}
