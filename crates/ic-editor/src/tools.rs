//! Tool selection and per-tool settings.
//!
//! The active tool decides how the controller interprets pointer input:
//!
//! | Tool | Down | Move | Up / Leave |
//! |------|------|------|------------|
//! | Pen / Eraser | dot | ink segment | snapshot |
//! | Rectangle / Circle / Line | anchor | resize | append + snapshot |
//! | Text | new empty text, edit | - | - |
//! | Move | hit-test, select | drag | snapshot if moved |

use ic_core::{CanvasConfig, Color, FontWeight, ShapeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
    Rectangle,
    Circle,
    Line,
    Text,
    Move,
}

impl ToolKind {
    /// The shape this tool drags out, if it is a shape tool.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Line => Some(ShapeKind::Line),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Eraser => "eraser",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Line => "line",
            ToolKind::Text => "text",
            ToolKind::Move => "move",
        }
    }
}

/// Current brush, shape and text settings applied to new content.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub color: Color,
    pub stroke_width: f64,
    pub eraser_width: f64,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: FontWeight,
}

impl ToolSettings {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            font_size: config.font_size,
            font_family: config.font_family.clone(),
            ..Self::default()
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            color: Color::BLACK,
            stroke_width: ic_core::DEFAULT_STROKE_WIDTH,
            eraser_width: 20.0,
            font_size: ic_core::DEFAULT_FONT_SIZE,
            font_family: ic_core::DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::Normal,
        }
    }
}
