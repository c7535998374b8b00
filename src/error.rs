//! Error types for the FinGenie assistant

use thiserror::Error;

/// Result type alias for FinGenie operations
pub type Result<T> = std::result::Result<T, FinGenieError>;

#[derive(Error, Debug)]
pub enum FinGenieError {

    // =============================
    // Domain Errors
    // =============================

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
