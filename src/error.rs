//! Error types for belrag.

use thiserror::Error;

/// Result type alias using belrag's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during pipeline construction and execution.
///
/// The algorithmic core (leasing, auditing) never fails mid-computation;
/// invalid configuration is rejected when components are constructed.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Retrieval error (e.g., empty corpus)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }
}
