pub mod assets;
pub mod error;
pub mod export;
pub mod font;
pub mod hit;
pub mod paint;
pub mod raster;

pub use assets::{AssetCache, AssetState};
pub use error::{ExportError, FontError};
pub use export::{ExportMode, ExportOptions, default_filename, encode_png, export_png, export_raster};
pub use font::FontBook;
pub use hit::hit_test;
pub use paint::{Background, FrameState, Renderer};
