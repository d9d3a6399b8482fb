pub mod config;
pub mod error;
pub mod format;
pub mod geometry;
pub mod id;
pub mod ink;
pub mod model;

pub use config::CanvasConfig;
pub use error::{ConfigError, FormatError, FormatResult};
pub use format::{SceneData, deserialize_scene, serialize_scene};
pub use geometry::{ApproxMeasure, ClientRect, Outline, PointerSample, TextMeasure, to_canvas_space};
pub use id::ObjectId;
pub use ink::InkLayer;
pub use model::*;

// Re-export kurbo geometry so downstream crates share one version
pub use kurbo::{Point, Rect, Vec2};
