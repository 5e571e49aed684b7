//! Error types shared across CampVouch crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Error type for common operations
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
