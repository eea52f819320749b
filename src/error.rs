//! Library error taxonomy
//!
//! `MpgError` is the single error type returned by the library layer. The
//! server wraps it in `server::error::ServerError` for HTTP responses.

use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MpgError>;

/// Errors produced by data loading, preprocessing, training, and inference.
#[derive(Error, Debug)]
pub enum MpgError {
    #[error("Missing target column: provide combination_mpg or both city_mpg and highway_mpg to derive the combined MPG")]
    MissingTargetColumn,

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid input: {0}")]
    BadInput(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for MpgError {
    fn from(err: polars::error::PolarsError) -> Self {
        MpgError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for MpgError {
    fn from(err: serde_json::Error) -> Self {
        MpgError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for MpgError {
    fn from(err: csv::Error) -> Self {
        MpgError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for MpgError {
    fn from(err: ndarray::ShapeError) -> Self {
        MpgError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
