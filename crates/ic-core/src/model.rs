//! Core data model for whiteboard scenes.
//!
//! A scene is an ordered list of drawable objects (shapes, text, images) on
//! top of a freehand ink raster. Array order is draw order: later objects
//! paint over earlier ones and win hit-tests where they overlap. There is no
//! separate z-index.

use crate::id::ObjectId;
use crate::ink::InkLayer;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGBA color, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Indigo accent used for selection and in-progress outlines.
    pub const ACCENT: Color = Color::rgb(0x63, 0x66, 0xF1);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<u8> { Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) };

        match bytes.len() {
            3 | 4 => {
                let mut channels = [255u8; 4];
                for (slot, &b) in channels.iter_mut().zip(bytes) {
                    *slot = hex_val(b)? * 17;
                }
                Some(Self::rgba(channels[0], channels[1], channels[2], channels[3]))
            }
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Drawables ───────────────────────────────────────────────────────────

pub const DEFAULT_FONT_FAMILY: &str = "Inter, Arial, sans-serif";
pub const DEFAULT_FONT_SIZE: f64 = 24.0;
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_stroke_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
}

impl ShapeKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Line => "line",
        }
    }
}

/// A stroked geometric shape defined by a drag from `(x, y)`.
///
/// `w`/`h` are signed deltas from the anchor to the pointer; negative values
/// mean the drag went up or left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ObjectId,
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub w: f64,
    #[serde(default)]
    pub h: f64,
    #[serde(default, alias = "color")]
    pub stroke_color: Color,
    #[serde(default = "default_stroke_width", alias = "stroke")]
    pub stroke_width: f64,
}

impl Shape {
    /// A zero-sized shape anchored at `anchor`, ready to be dragged out.
    pub fn anchored(kind: ShapeKind, anchor: Point, stroke_color: Color, stroke_width: f64) -> Self {
        Self {
            id: ObjectId::fresh(kind.id_prefix()),
            kind,
            x: anchor.x,
            y: anchor.y,
            w: 0.0,
            h: 0.0,
            stroke_color,
            stroke_width,
        }
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The opposite end of the drag: `anchor + (w, h)`.
    pub fn end(&self) -> Point {
        Point::new(self.x + self.w, self.y + self.h)
    }

    /// Circles are dragged along their bounding diagonal: the center is the
    /// diagonal's midpoint.
    pub fn circle_center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Half the drag diagonal, `sqrt(w² + h²) / 2`.
    pub fn circle_radius(&self) -> f64 {
        Vec2::new(self.w, self.h).hypot() / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Italic,
}

/// A borrowed font description used for measuring and drawing text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub size: f64,
    pub weight: FontWeight,
}

/// A single-line text label. `(x, y)` is the top-left origin of the line box.
///
/// Width is never stored: it comes from the text measurer whenever the
/// content or font changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
}

impl TextObject {
    /// An empty text object at `origin`.
    pub fn empty_at(origin: Point, color: Color, font_size: f64, font_family: &str, font_weight: FontWeight) -> Self {
        Self {
            id: ObjectId::fresh("text"),
            x: origin.x,
            y: origin.y,
            text: String::new(),
            color,
            font_size,
            font_family: font_family.to_string(),
            font_weight,
        }
    }

    pub fn font(&self) -> FontSpec<'_> {
        FontSpec {
            family: &self.font_family,
            size: self.font_size,
            weight: self.font_weight,
        }
    }
}

/// A placed bitmap. The URL is an opaque handle resolved by the asset loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub image_url: String,
}

impl ImageObject {
    pub fn new(image_url: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            id: ObjectId::fresh("image"),
            x,
            y,
            w,
            h,
            image_url: image_url.into(),
        }
    }
}

/// Anything that can be placed in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Drawable {
    Shape(Shape),
    Text(TextObject),
    Image(ImageObject),
}

impl Drawable {
    pub fn id(&self) -> ObjectId {
        match self {
            Drawable::Shape(s) => s.id,
            Drawable::Text(t) => t.id,
            Drawable::Image(i) => i.id,
        }
    }

    /// Anchor / top-left origin. This is what the move tool drags.
    pub fn origin(&self) -> Point {
        match self {
            Drawable::Shape(s) => Point::new(s.x, s.y),
            Drawable::Text(t) => Point::new(t.x, t.y),
            Drawable::Image(i) => Point::new(i.x, i.y),
        }
    }

    pub fn set_origin(&mut self, p: Point) {
        let (x, y) = match self {
            Drawable::Shape(s) => (&mut s.x, &mut s.y),
            Drawable::Text(t) => (&mut t.x, &mut t.y),
            Drawable::Image(i) => (&mut i.x, &mut i.y),
        };
        *x = p.x;
        *y = p.y;
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Drawable::Shape(s) => match s.kind {
                ShapeKind::Rectangle => "rectangle",
                ShapeKind::Circle => "circle",
                ShapeKind::Line => "line",
            },
            Drawable::Text(_) => "text",
            Drawable::Image(_) => "image",
        }
    }

    /// Apply a sparse update. Fields that make no sense for this kind are
    /// ignored. Returns whether anything changed.
    pub fn apply_patch(&mut self, patch: &ObjectPatch) -> bool {
        let before = self.clone();
        if let Some(x) = patch.x {
            let y = self.origin().y;
            self.set_origin(Point::new(x, y));
        }
        if let Some(y) = patch.y {
            let x = self.origin().x;
            self.set_origin(Point::new(x, y));
        }
        match self {
            Drawable::Shape(s) => {
                if let Some(w) = patch.w {
                    s.w = w;
                }
                if let Some(h) = patch.h {
                    s.h = h;
                }
                if let Some(c) = patch.color {
                    s.stroke_color = c;
                }
                if let Some(sw) = patch.stroke_width {
                    s.stroke_width = sw;
                }
            }
            Drawable::Text(t) => {
                if let Some(ref text) = patch.text {
                    t.text.clone_from(text);
                }
                if let Some(c) = patch.color {
                    t.color = c;
                }
                if let Some(size) = patch.font_size {
                    t.font_size = size;
                }
                if let Some(ref family) = patch.font_family {
                    t.font_family.clone_from(family);
                }
                if let Some(weight) = patch.font_weight {
                    t.font_weight = weight;
                }
            }
            Drawable::Image(i) => {
                if let Some(w) = patch.w {
                    i.w = w;
                }
                if let Some(h) = patch.h {
                    i.h = h;
                }
                if let Some(ref url) = patch.image_url {
                    i.image_url.clone_from(url);
                }
            }
        }
        *self != before
    }
}

/// Sparse update for a drawable. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ObjectPatch {
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// The committed contents of a canvas: ordered objects over an ink layer.
///
/// Mutations here have no side effects: rendering and history snapshots are
/// orchestrated by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    objects: Vec<Drawable>,
    ink: InkLayer,
}

impl Scene {
    /// An empty scene with a blank ink layer of the given canvas size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            objects: Vec::new(),
            ink: InkLayer::new(width, height),
        }
    }

    pub fn from_parts(objects: Vec<Drawable>, ink: InkLayer) -> Self {
        Self { objects, ink }
    }

    /// Append an object on top of the scene. An object whose ID is already
    /// present is rejected.
    pub fn add_object(&mut self, obj: Drawable) -> bool {
        let id = obj.id();
        if self.index_of(id).is_some() {
            log::warn!("rejecting duplicate object id {id}");
            return false;
        }
        self.objects.push(obj);
        true
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<Drawable> {
        let idx = self.index_of(id)?;
        Some(self.objects.remove(idx))
    }

    /// Apply a sparse update to an existing object. Returns false if the
    /// object doesn't exist or nothing changed.
    pub fn update_object(&mut self, id: ObjectId, patch: &ObjectPatch) -> bool {
        self.get_mut(id).is_some_and(|obj| obj.apply_patch(patch))
    }

    /// All objects in draw order.
    pub fn all(&self) -> &[Drawable] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&Drawable> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Drawable> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Bottom-to-top: the order objects are painted in.
    pub fn draw_order(&self) -> std::slice::Iter<'_, Drawable> {
        self.objects.iter()
    }

    /// Top-to-bottom: the order hit-tests consider objects in. Always the
    /// exact reverse of [`Scene::draw_order`].
    pub fn hit_order(&self) -> std::iter::Rev<std::slice::Iter<'_, Drawable>> {
        self.draw_order().rev()
    }

    /// Number of objects (ink is not counted).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when there are no objects and the ink layer is blank.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.ink.is_blank()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.ink.clear();
    }

    pub fn ink(&self) -> &InkLayer {
        &self.ink
    }

    pub fn ink_mut(&mut self) -> &mut InkLayer {
        &mut self.ink
    }

    pub fn summary(&self) -> SceneSummary {
        let mut summary = SceneSummary {
            has_ink: !self.ink.is_blank(),
            ..Default::default()
        };
        for obj in &self.objects {
            match obj {
                Drawable::Shape(s) => match s.kind {
                    ShapeKind::Rectangle => summary.rectangles += 1,
                    ShapeKind::Circle => summary.circles += 1,
                    ShapeKind::Line => summary.lines += 1,
                },
                Drawable::Text(_) => summary.texts += 1,
                Drawable::Image(_) => summary.images += 1,
            }
        }
        summary
    }
}

/// Read-only digest of a scene: object counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub rectangles: usize,
    pub circles: usize,
    pub lines: usize,
    pub texts: usize,
    pub images: usize,
    pub has_ink: bool,
}

impl SceneSummary {
    pub fn shapes(&self) -> usize {
        self.rectangles + self.circles + self.lines
    }

    pub fn total(&self) -> usize {
        self.shapes() + self.texts + self.images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Drawable {
        Drawable::Shape(Shape {
            id: ObjectId::intern(id),
            kind: ShapeKind::Rectangle,
            x,
            y,
            w,
            h,
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
        })
    }

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6366F1").unwrap();
        assert_eq!(c, Color::ACCENT);
        assert_eq!(c.to_hex(), "#6366F1");

        let short = Color::from_hex("f00").unwrap();
        assert_eq!(short, Color::rgb(255, 0, 0));

        let alpha = Color::from_hex("#00000080").unwrap();
        assert_eq!(alpha.a, 0x80);
        assert_eq!(alpha.to_hex(), "#00000080");

        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("zzz").is_none());
    }

    #[test]
    fn circle_derivation_uses_drag_diagonal() {
        let shape = Shape {
            id: ObjectId::intern("c1"),
            kind: ShapeKind::Circle,
            x: 10.0,
            y: 10.0,
            w: 40.0,
            h: 80.0,
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
        };
        assert_eq!(shape.circle_center(), Point::new(30.0, 50.0));
        assert!((shape.circle_radius() - 44.72).abs() < 0.01);
    }

    #[test]
    fn scene_add_remove_update() {
        let mut scene = Scene::new(100, 100);
        assert!(scene.add_object(rect("a", 0.0, 0.0, 10.0, 10.0)));
        assert!(scene.add_object(rect("b", 5.0, 5.0, 10.0, 10.0)));
        assert!(!scene.add_object(rect("a", 50.0, 50.0, 1.0, 1.0)), "duplicate id");
        assert_eq!(scene.len(), 2);

        let moved = scene.update_object(ObjectId::intern("a"), &ObjectPatch::position(Point::new(3.0, 4.0)));
        assert!(moved);
        assert_eq!(scene.get(ObjectId::intern("a")).unwrap().origin(), Point::new(3.0, 4.0));

        // Same position again: nothing changes.
        assert!(!scene.update_object(ObjectId::intern("a"), &ObjectPatch::position(Point::new(3.0, 4.0))));
        assert!(!scene.update_object(ObjectId::intern("missing"), &ObjectPatch::position(Point::ZERO)));

        let removed = scene.remove_object(ObjectId::intern("a")).unwrap();
        assert_eq!(removed.id(), ObjectId::intern("a"));
        assert_eq!(scene.len(), 1);
        assert!(scene.remove_object(ObjectId::intern("a")).is_none());
    }

    #[test]
    fn hit_order_is_reverse_of_draw_order() {
        let mut scene = Scene::new(10, 10);
        for id in ["one", "two", "three"] {
            scene.add_object(rect(id, 0.0, 0.0, 1.0, 1.0));
        }
        let draw: Vec<_> = scene.draw_order().map(Drawable::id).collect();
        let mut hit: Vec<_> = scene.hit_order().map(Drawable::id).collect();
        hit.reverse();
        assert_eq!(draw, hit);
    }

    #[test]
    fn patch_ignores_fields_of_other_kinds() {
        let mut text = Drawable::Text(TextObject::empty_at(
            Point::new(1.0, 2.0),
            Color::BLACK,
            24.0,
            DEFAULT_FONT_FAMILY,
            FontWeight::Normal,
        ));
        let patch = ObjectPatch {
            w: Some(100.0),
            text: Some("hello".into()),
            ..Default::default()
        };
        assert!(text.apply_patch(&patch));
        match &text {
            Drawable::Text(t) => assert_eq!(t.text, "hello"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn summary_counts_kinds() {
        let mut scene = Scene::new(10, 10);
        scene.add_object(rect("r", 0.0, 0.0, 1.0, 1.0));
        scene.add_object(Drawable::Image(ImageObject::new("data:,", 0.0, 0.0, 5.0, 5.0)));
        let summary = scene.summary();
        assert_eq!(summary.rectangles, 1);
        assert_eq!(summary.images, 1);
        assert_eq!(summary.total(), 2);
        assert!(!summary.has_ink);
    }
}
