//! Error types shared across docsync crates.

use thiserror::Error;

/// Errors raised by the shared types layer.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record type not registered
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
