//! Raster export: full canvas or cropped to content.
//!
//! Export renders committed content only (no selection or in-progress
//! overlays). A scene with no objects and no ink is an error in either mode
//! rather than a silent blank image.

use crate::assets::AssetCache;
use crate::error::ExportError;
use crate::paint::{Background, FrameState, Renderer};
use ic_core::config::DEFAULT_EXPORT_PADDING;
use ic_core::geometry::{Outline, TextMeasure, union_bounds};
use ic_core::Scene;
use image::{ImageFormat, RgbaImage};
use kurbo::{Rect, Vec2};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    FullCanvas,
    CroppedToContent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub mode: ExportMode,
    pub background: Background,
    /// Margin around content in cropped mode.
    pub padding: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            mode: ExportMode::FullCanvas,
            background: Background::Opaque(ic_core::Color::WHITE),
            padding: DEFAULT_EXPORT_PADDING,
        }
    }
}

/// Union of every object's outline (grown by half its stroke) and the inked
/// pixels. `None` when there is nothing to draw.
pub fn content_bounds(scene: &Scene, measure: &dyn TextMeasure) -> Option<Rect> {
    let objects = scene.draw_order().map(|obj| Outline::of(obj, measure).painted_bounds());
    union_bounds(objects.chain(scene.ink().content_bounds()))
}

/// The canvas-space pixel region an export covers.
pub fn export_region(scene: &Scene, measure: &dyn TextMeasure, options: &ExportOptions) -> Result<Rect, ExportError> {
    if scene.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let canvas = Rect::new(0.0, 0.0, scene.ink().width() as f64, scene.ink().height() as f64);
    match options.mode {
        ExportMode::FullCanvas => Ok(canvas),
        ExportMode::CroppedToContent => {
            let content = content_bounds(scene, measure).ok_or(ExportError::NothingToExport)?;
            let padded = content.inflate(options.padding, options.padding).expand();
            let clamped = padded.intersect(canvas);
            if clamped.width() <= 0.0 || clamped.height() <= 0.0 {
                return Err(ExportError::EmptyRegion);
            }
            Ok(clamped)
        }
    }
}

pub fn export_raster(
    renderer: &Renderer,
    scene: &Scene,
    assets: &AssetCache,
    options: &ExportOptions,
) -> Result<RgbaImage, ExportError> {
    let region = export_region(scene, renderer.fonts(), options)?;
    let mut target = RgbaImage::new(region.width() as u32, region.height() as u32);
    renderer.render_into(
        &mut target,
        Vec2::new(region.x0, region.y0),
        scene,
        assets,
        options.background,
        &FrameState::committed_only(),
    );
    log::debug!(
        "exported {:?} region {}x{} at ({}, {})",
        options.mode,
        target.width(),
        target.height(),
        region.x0,
        region.y0
    );
    Ok(target)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

pub fn export_png(
    renderer: &Renderer,
    scene: &Scene,
    assets: &AssetCache,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    encode_png(&export_raster(renderer, scene, assets, options)?)
}

/// Suggested download name: `<slug>_drawing.png`.
pub fn default_filename(project_name: &str) -> String {
    let mut slug = String::new();
    for c in project_name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    let slug = if slug.is_empty() { "infinite_canvas" } else { slug };
    format!("{slug}_drawing.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filename_slug() {
        assert_eq!(default_filename(""), "infinite_canvas_drawing.png");
        assert_eq!(default_filename("   "), "infinite_canvas_drawing.png");
        assert_eq!(default_filename("My Board: v2!"), "my_board_v2_drawing.png");
    }

    #[test]
    fn empty_scene_is_an_error_in_both_modes() {
        let scene = Scene::new(100, 100);
        let renderer = Renderer::default();
        for mode in [ExportMode::FullCanvas, ExportMode::CroppedToContent] {
            let options = ExportOptions {
                mode,
                ..Default::default()
            };
            let err = export_raster(&renderer, &scene, &AssetCache::new(), &options).unwrap_err();
            assert!(matches!(err, ExportError::NothingToExport), "{mode:?}: {err}");
        }
    }
}
