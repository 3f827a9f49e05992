use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors: the dataset, the configuration or the local filesystem is broken.
///
/// Rejected rectangles are not errors (see `rectangle::ParsedRectangles`), and a failed
/// upload to the mask server is reported per image through `masks::UploadError`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("TOML config file error: {0}")]
    TomlConfig(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected dataset layout: {0}")]
    Layout(String),

    #[error("{path:?}:{line}: cannot parse coordinate {token:?}")]
    InvalidCoordinate {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("{path:?}:{line}: expected two coordinates")]
    MissingCoordinate { path: PathBuf, line: usize },

    #[error("Dataset is not aligned: {0}")]
    MisalignedDataset(String),

    #[error("Image loading failed for {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Image saving failed for {path:?}: {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type with default AppError
pub type Result<T, E = AppError> = std::result::Result<T, E>;
