//! Error types for the money commander wizard

use thiserror::Error;

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;

#[derive(Error, Debug)]
pub enum WizardError {

    // =============================
    // Core Errors
    // =============================

    #[error("Agent gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

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
