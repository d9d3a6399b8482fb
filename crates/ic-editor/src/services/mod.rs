//! External collaborators: persistence, image generation, suggestions and
//! asset fetching.
//!
//! Each collaborator is an async trait so hosts can swap in their own
//! implementation; the editor only ever talks to the trait objects.

pub mod generate;
pub mod loader;
pub mod store;
pub mod suggest;

pub use generate::{GeneratorConfig, ImageGenerator, OpenAiImageGenerator, describe_scene};
pub use loader::{AssetLoader, DefaultAssetLoader};
pub use store::{FileStore, MemoryStore, ProjectStore};
pub use suggest::{LocalSuggester, Suggester};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid data url")]
    InvalidDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid project key `{0}`")]
    InvalidKey(String),
    #[error("scene format: {0}")]
    Format(#[from] ic_core::FormatError),
    #[error("export failed: {0}")]
    Export(#[from] ic_render::ExportError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
