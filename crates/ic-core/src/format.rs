//! Scene persistence: `Scene` ⇄ `SceneData` ⇄ JSON / MessagePack.
//!
//! `SceneData` is the wire shape. Objects are stored as their tagged union
//! (`"type": "shape" | "text" | "image"`), the ink layer as a base64 PNG. Any
//! optional field missing from the input takes its documented default, so
//! older or hand-written projects still load.

use crate::config::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, canvas_size_valid};
use crate::error::{FormatError, FormatResult};
use crate::ink::InkLayer;
use crate::model::{Drawable, Scene};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Cursor;

fn default_width() -> u32 {
    DEFAULT_CANVAS_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_CANVAS_HEIGHT
}

/// Serialized form of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub objects: Vec<Drawable>,
    /// Base64 PNG of the ink layer. Absent when the layer is blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ink: Option<String>,
}

// ─── Scene ⇄ SceneData ───────────────────────────────────────────────────

pub fn serialize_scene(scene: &Scene) -> FormatResult<SceneData> {
    let ink = scene.ink();
    let encoded = if ink.is_blank() {
        None
    } else {
        Some(STANDARD.encode(encode_png(ink.image())?))
    };
    Ok(SceneData {
        width: ink.width(),
        height: ink.height(),
        objects: scene.all().to_vec(),
        ink: encoded,
    })
}

pub fn deserialize_scene(data: SceneData) -> FormatResult<Scene> {
    let SceneData {
        width,
        height,
        objects,
        ink,
    } = data;
    if !canvas_size_valid(width, height) {
        return Err(FormatError::InvalidSize { width, height });
    }

    let mut seen = HashSet::with_capacity(objects.len());
    for obj in &objects {
        if !seen.insert(obj.id()) {
            return Err(FormatError::DuplicateId(obj.id().to_string()));
        }
    }

    let layer = match ink {
        Some(b64) if !b64.is_empty() => InkLayer::from_image(decode_ink(&b64, width, height)?),
        _ => InkLayer::new(width, height),
    };
    log::debug!("loaded scene {width}x{height} with {} objects", objects.len());
    Ok(Scene::from_parts(objects, layer))
}

fn encode_png(img: &RgbaImage) -> FormatResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Decode a base64 PNG into a `width`×`height` buffer. A stored layer of a
/// different size is placed at the origin and cropped or padded to fit.
fn decode_ink(b64: &str, width: u32, height: u32) -> FormatResult<RgbaImage> {
    let bytes = STANDARD.decode(b64.trim())?;
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?.to_rgba8();
    if decoded.dimensions() == (width, height) {
        return Ok(decoded);
    }
    log::warn!(
        "ink layer is {}x{}, canvas is {width}x{height}; fitting",
        decoded.width(),
        decoded.height()
    );
    let mut fitted = RgbaImage::new(width, height);
    image::imageops::replace(&mut fitted, &decoded, 0, 0);
    Ok(fitted)
}

// ─── Encodings ───────────────────────────────────────────────────────────

pub fn to_json(scene: &Scene) -> FormatResult<String> {
    Ok(serde_json::to_string_pretty(&serialize_scene(scene)?)?)
}

pub fn from_json(text: &str) -> FormatResult<Scene> {
    deserialize_scene(serde_json::from_str(text)?)
}

pub fn to_msgpack(scene: &Scene) -> FormatResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(&serialize_scene(scene)?)?)
}

pub fn from_msgpack(bytes: &[u8]) -> FormatResult<Scene> {
    deserialize_scene(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, FontWeight, ShapeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_json_takes_defaults() {
        let json = r#"{
            "objects": [
                { "type": "text", "id": "t1", "x": 5, "y": 6, "text": "hi" },
                { "type": "shape", "id": "s1", "kind": "line", "x": 0, "y": 0, "w": 10, "h": 10 }
            ]
        }"#;
        let scene = from_json(json).unwrap();
        assert_eq!(scene.ink().width(), DEFAULT_CANVAS_WIDTH);
        assert_eq!(scene.ink().height(), DEFAULT_CANVAS_HEIGHT);
        match &scene.all()[0] {
            Drawable::Text(t) => {
                assert_eq!(t.font_family, crate::model::DEFAULT_FONT_FAMILY);
                assert_eq!(t.font_weight, FontWeight::Normal);
                assert_eq!(t.font_size, 24.0);
                assert_eq!(t.color, Color::BLACK);
            }
            other => panic!("expected text, got {other:?}"),
        }
        match &scene.all()[1] {
            Drawable::Shape(s) => {
                assert_eq!(s.kind, ShapeKind::Line);
                assert_eq!(s.stroke_width, 2.0);
            }
            other => panic!("expected shape, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "objects": [
            { "type": "image", "id": "dup", "x": 0, "y": 0, "w": 1, "h": 1, "image_url": "a" },
            { "type": "image", "id": "dup", "x": 0, "y": 0, "w": 1, "h": 1, "image_url": "b" }
        ] }"#;
        assert!(matches!(from_json(json), Err(FormatError::DuplicateId(id)) if id == "dup"));
    }

    #[test]
    fn zero_size_canvas_is_rejected() {
        let json = r#"{ "width": 0, "height": 10 }"#;
        assert!(matches!(from_json(json), Err(FormatError::InvalidSize { .. })));
    }

    #[test]
    fn oversized_canvas_is_an_error_not_an_allocation() {
        let json = r#"{ "width": 4294967295, "height": 4294967295 }"#;
        assert!(matches!(
            from_json(json),
            Err(FormatError::InvalidSize {
                width: 4294967295,
                height: 4294967295
            })
        ));
        let just_over = r#"{ "width": 8193, "height": 10 }"#;
        assert!(matches!(from_json(just_over), Err(FormatError::InvalidSize { .. })));
        assert!(from_json(r#"{ "width": 8192, "height": 1 }"#).is_ok());
    }

    #[test]
    fn blank_ink_is_omitted() {
        let scene = Scene::new(4, 4);
        let data = serialize_scene(&scene).unwrap();
        assert_eq!(data.ink, None);
        let json = to_json(&scene).unwrap();
        assert!(!json.contains("\"ink\""));
    }

    #[test]
    fn mismatched_ink_is_fitted() {
        let mut small = RgbaImage::new(2, 2);
        small.put_pixel(1, 1, image::Rgba([1, 2, 3, 255]));
        let data = SceneData {
            width: 4,
            height: 3,
            objects: vec![],
            ink: Some(STANDARD.encode(encode_png(&small).unwrap())),
        };
        let scene = deserialize_scene(data).unwrap();
        assert_eq!(scene.ink().image().dimensions(), (4, 3));
        assert_eq!(scene.ink().image().get_pixel(1, 1).0, [1, 2, 3, 255]);
    }
}
