#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),
    #[error("ink layer is not valid base64: {0}")]
    InkBase64(#[from] base64::DecodeError),
    #[error("ink layer image: {0}")]
    InkImage(#[from] image::ImageError),
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("duplicate object id `{0}`")]
    DuplicateId(String),
}

pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: `{value}`")]
    InvalidEnv { key: &'static str, value: String },
}
