//! Error types for the Prediction Engine

use thiserror::Error;

/// Result type for Prediction Engine operations
pub type Result<T> = std::result::Result<T, PredictionError>;

/// Errors that can occur while building a prediction
///
/// None of these cross the engine façade: `PredictionEngine::predict` and the
/// batch operations substitute a baseline prediction instead.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Historical data lookup failed: {0}")]
    DataAccess(String),

    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("Model task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<String> for PredictionError {
    fn from(err: String) -> Self {
        PredictionError::Internal(err)
    }
}

impl From<&str> for PredictionError {
    fn from(err: &str) -> Self {
        PredictionError::Internal(err.to_string())
    }
}
