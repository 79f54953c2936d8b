//! Centralized error types for PM-AJAY.

use thiserror::Error;

/// Main error type for PM-AJAY operations.
#[derive(Error, Debug)]
pub enum AjayError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),

    #[error("Storage error: {0}")]
    Store(#[from] ajay_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for PM-AJAY operations.
pub type AjayResult<T> = Result<T, AjayError>;
