//! Geometry shared by rendering, hit-testing and export bounds.
//!
//! Every drawable kind has exactly one [`Outline`]: the renderer strokes it,
//! the hit-tester asks it for containment and export unions its bounds. Keeping
//! a single definition is what keeps "what you see" and "what you can click"
//! in agreement.

use crate::model::{Drawable, FontSpec, FontWeight, ShapeKind};
use kurbo::{Circle, Line, Point, Rect, Vec2};

/// Minimum distance in canvas pixels within which a line counts as hit.
pub const LINE_HIT_TOLERANCE: f64 = 5.0;

/// Extra height below `font_size` included in a text object's box.
pub const TEXT_BOX_PADDING: f64 = 4.0;

/// Advance per character, as a fraction of font size, when no real font
/// metrics are available.
pub const APPROX_ADVANCE: f64 = 0.55;
pub const APPROX_ADVANCE_BOLD: f64 = 0.6;

// ─── Pointer mapping ─────────────────────────────────────────────────────

/// On-screen placement of the canvas, in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Map a client-space coordinate into canvas space.
pub fn to_canvas_space(client_x: f64, client_y: f64, rect: &ClientRect) -> Point {
    Point::new(client_x - rect.left, client_y - rect.top)
}

/// A raw pointer reading from the host, before mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerSample {
    Mouse { client_x: f64, client_y: f64 },
    /// Active touch points in client space. Only the first one is used.
    Touch { touches: Vec<(f64, f64)> },
}

impl PointerSample {
    /// Canvas-space position of this sample. `None` for a touch event
    /// that carries no touch points.
    pub fn canvas_point(&self, rect: &ClientRect) -> Option<Point> {
        match self {
            PointerSample::Mouse { client_x, client_y } => Some(to_canvas_space(*client_x, *client_y, rect)),
            PointerSample::Touch { touches } => touches.first().map(|&(x, y)| to_canvas_space(x, y, rect)),
        }
    }
}

// ─── Text measurement ────────────────────────────────────────────────────

/// Text measurement supplied by whatever surface draws the text.
pub trait TextMeasure {
    /// Width in canvas pixels of `text` set in `font`, single line.
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f64;
}

/// Fixed-advance metrics: every character is the same width.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl ApproxMeasure {
    pub fn advance(font: &FontSpec<'_>) -> f64 {
        let factor = match font.weight {
            FontWeight::Bold => APPROX_ADVANCE_BOLD,
            FontWeight::Normal | FontWeight::Italic => APPROX_ADVANCE,
        };
        font.size * factor
    }
}

impl TextMeasure for ApproxMeasure {
    fn text_width(&self, text: &str, font: &FontSpec<'_>) -> f64 {
        text.chars().count() as f64 * Self::advance(font)
    }
}

// ─── Outlines ────────────────────────────────────────────────────────────

/// The geometric footprint of one drawable. Shape variants carry `stroke`,
/// half the stroke width, since the painted stroke straddles the geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    /// Rectangle shape, normalized so `x0 <= x1`, `y0 <= y1`.
    Rect { rect: Rect, stroke: f64 },
    Circle { circle: Circle, stroke: f64 },
    /// Line shape. Hits within `max(LINE_HIT_TOLERANCE, stroke)`.
    Segment { line: Line, stroke: f64 },
    TextBox(Rect),
    ImageBox(Rect),
}

impl Outline {
    pub fn of(obj: &Drawable, measure: &dyn TextMeasure) -> Outline {
        match obj {
            Drawable::Shape(s) => {
                let stroke = s.stroke_width.max(0.0) / 2.0;
                match s.kind {
                    ShapeKind::Rectangle => Outline::Rect {
                        rect: Rect::from_points(s.anchor(), s.end()),
                        stroke,
                    },
                    ShapeKind::Circle => Outline::Circle {
                        circle: Circle::new(s.circle_center(), s.circle_radius()),
                        stroke,
                    },
                    ShapeKind::Line => Outline::Segment {
                        line: Line::new(s.anchor(), s.end()),
                        stroke,
                    },
                }
            }
            Drawable::Text(t) => {
                let width = measure.text_width(&t.text, &t.font());
                Outline::TextBox(Rect::new(t.x, t.y, t.x + width, t.y + t.font_size + TEXT_BOX_PADDING))
            }
            Drawable::Image(i) => Outline::ImageBox(Rect::from_points((i.x, i.y), (i.x + i.w, i.y + i.h))),
        }
    }

    /// Whether `p` lies on or inside the painted footprint, stroke included.
    /// Box edges are inclusive.
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Outline::Rect { rect, stroke } => box_contains(rect.inflate(*stroke, *stroke), p),
            Outline::TextBox(r) | Outline::ImageBox(r) => box_contains(*r, p),
            Outline::Circle { circle, stroke } => {
                let r = circle.radius + stroke;
                (p - circle.center).hypot2() <= r * r
            }
            Outline::Segment { line, stroke } => {
                distance_to_segment(p, line.p0, line.p1) < LINE_HIT_TOLERANCE.max(*stroke)
            }
        }
    }

    /// Axis-aligned bounds of the geometry, stroke not included.
    pub fn bounds(&self) -> Rect {
        match self {
            Outline::Rect { rect, .. } => *rect,
            Outline::TextBox(r) | Outline::ImageBox(r) => *r,
            Outline::Circle { circle, .. } => {
                Rect::from_center_size(circle.center, (circle.radius * 2.0, circle.radius * 2.0))
            }
            Outline::Segment { line, .. } => Rect::from_points(line.p0, line.p1),
        }
    }

    /// Bounds of what the renderer paints: geometry grown by half the stroke.
    pub fn painted_bounds(&self) -> Rect {
        match self {
            Outline::Rect { stroke, .. } | Outline::Circle { stroke, .. } | Outline::Segment { stroke, .. } => {
                self.bounds().inflate(*stroke, *stroke)
            }
            Outline::TextBox(r) | Outline::ImageBox(r) => *r,
        }
    }
}

fn box_contains(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Euclidean distance from `p` to the closed segment `a..b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab: Vec2 = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Smallest rectangle covering every rectangle in `rects`.
pub fn union_bounds(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectId;
    use crate::model::{Color, Shape, TextObject};
    use pretty_assertions::assert_eq;

    fn shape(kind: ShapeKind, x: f64, y: f64, w: f64, h: f64) -> Drawable {
        Drawable::Shape(Shape {
            id: ObjectId::intern("g"),
            kind,
            x,
            y,
            w,
            h,
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
        })
    }

    #[test]
    fn canvas_space_subtracts_offset() {
        let rect = ClientRect {
            left: 100.0,
            top: 50.0,
            width: 800.0,
            height: 600.0,
        };
        assert_eq!(to_canvas_space(150.0, 70.0, &rect), Point::new(50.0, 20.0));

        let mouse = PointerSample::Mouse {
            client_x: 150.0,
            client_y: 70.0,
        };
        let touch = PointerSample::Touch {
            touches: vec![(150.0, 70.0), (400.0, 400.0)],
        };
        assert_eq!(mouse.canvas_point(&rect), touch.canvas_point(&rect));
        assert_eq!(PointerSample::Touch { touches: vec![] }.canvas_point(&rect), None);
    }

    #[test]
    fn negative_drag_rect_is_normalized() {
        let outline = Outline::of(&shape(ShapeKind::Rectangle, 100.0, 100.0, -50.0, -20.0), &ApproxMeasure);
        assert_eq!(outline.bounds(), Rect::new(50.0, 80.0, 100.0, 100.0));
        assert!(outline.contains(Point::new(75.0, 90.0)));
        assert!(outline.contains(Point::new(50.0, 80.0)), "edges are inclusive");
        assert!(outline.contains(Point::new(101.0, 90.0)), "half the stroke counts");
        assert!(!outline.contains(Point::new(101.5, 90.0)));
    }

    #[test]
    fn circle_containment() {
        let outline = Outline::of(&shape(ShapeKind::Circle, 10.0, 10.0, 40.0, 80.0), &ApproxMeasure);
        assert!(outline.contains(Point::new(30.0, 50.0)));
        assert!(outline.contains(Point::new(30.0 + 45.5, 50.0)));
        assert!(!outline.contains(Point::new(30.0 + 46.0, 50.0)));
    }

    #[test]
    fn thick_strokes_widen_the_hit_area() {
        let thick = Drawable::Shape(Shape {
            id: ObjectId::intern("thick"),
            kind: ShapeKind::Rectangle,
            x: 50.0,
            y: 50.0,
            w: 100.0,
            h: 100.0,
            stroke_color: Color::BLACK,
            stroke_width: 20.0,
        });
        let outline = Outline::of(&thick, &ApproxMeasure);
        assert!(outline.contains(Point::new(44.0, 100.0)));
        assert!(outline.contains(Point::new(40.0, 40.0)));
        assert!(!outline.contains(Point::new(39.0, 100.0)));
        assert_eq!(outline.painted_bounds(), Rect::new(40.0, 40.0, 160.0, 160.0));
    }

    #[test]
    fn line_tolerance() {
        let outline = Outline::of(&shape(ShapeKind::Line, 0.0, 0.0, 100.0, 0.0), &ApproxMeasure);
        assert!(outline.contains(Point::new(50.0, 4.9)));
        assert!(!outline.contains(Point::new(50.0, 5.0)));
        assert!(!outline.contains(Point::new(106.0, 0.0)));
    }

    #[test]
    fn text_box_uses_measured_width() {
        let text = Drawable::Text(TextObject {
            id: ObjectId::intern("t"),
            x: 10.0,
            y: 20.0,
            text: "abcd".into(),
            color: Color::BLACK,
            font_size: 20.0,
            font_family: "sans".into(),
            font_weight: FontWeight::Normal,
        });
        let bounds = Outline::of(&text, &ApproxMeasure).bounds();
        assert_eq!(bounds.origin(), Point::new(10.0, 20.0));
        assert!((bounds.width() - 44.0).abs() < 1e-9);
        assert_eq!(bounds.height(), 20.0 + TEXT_BOX_PADDING);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let d = distance_to_segment(Point::new(-3.0, 4.0), Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(d, 5.0);
        let degenerate = distance_to_segment(Point::new(3.0, 4.0), Point::ZERO, Point::ZERO);
        assert_eq!(degenerate, 5.0);
    }
}
