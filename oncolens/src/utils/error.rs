//! Error types for the OncoLens library
//!
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for OncoLens operations
#[derive(Error, Debug)]
pub enum OncoLensError {
    /// The uploaded or on-disk bytes could not be decoded as an image
    #[error("Cannot identify image, it may be corrupted or an unsupported format: {0}")]
    ImageDecode(String),

    /// Error loading an image file
    #[error("Failed to load image at {0:?}: {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error with model operations (load/save/record)
    #[error("Model error: {0}")]
    Model(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Error during inference
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path not found
    #[error("Path not found: {0:?}")]
    PathNotFound(PathBuf),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience Result type for OncoLens operations
pub type Result<T> = std::result::Result<T, OncoLensError>;

impl From<image::ImageError> for OncoLensError {
    fn from(err: image::ImageError) -> Self {
        OncoLensError::ImageDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OncoLensError::Dataset("no samples".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no samples");
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/path/to/scan.jpg");
        let err = OncoLensError::ImageLoad(path, "file not found".to_string());
        assert!(format!("{}", err).contains("scan.jpg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: OncoLensError = io.into();
        assert!(matches!(err, OncoLensError::Io(_)));
    }
}
