//! Error types for a3s-containment

use thiserror::Error;

/// Errors that can occur when building or decoding containment state
///
/// Registry operations themselves never fail; they report outcomes through
/// `bool` and `Option`. These variants cover construction and conversion.
#[derive(Debug, Error)]
pub enum ContainmentError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Threat level outside the 1..=4 scale
    #[error("Invalid threat level {0}: expected a value between 1 and 4")]
    InvalidThreatLevel(i64),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for containment operations
pub type Result<T> = std::result::Result<T, ContainmentError>;
