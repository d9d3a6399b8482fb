#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse font: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the canvas is empty")]
    NothingToExport,
    #[error("export region is empty after clamping to the canvas")]
    EmptyRegion,
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}
