use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for skeleton topology analysis
#[derive(Error, Debug)]
pub enum SkeletonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    /// Raster rejected before any processing took place
    #[error("Invalid input raster: {0}")]
    InvalidInput(String),

    /// Tracing or classification produced a topology that cannot exist.
    /// Results computed so far must be discarded.
    #[error("Inconsistent skeleton topology at pixel {index}: {detail}")]
    InconsistentTopology {
        index: usize,
        detail: String,
    },

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, SkeletonError>;
