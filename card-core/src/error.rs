//! Error types for design-document operations.

use thiserror::Error;

/// Result type for design-document operations.
pub type DesignResult<T> = Result<T, DesignError>;

/// Errors that can occur reading or validating a design document.
#[derive(Debug, Error)]
pub enum DesignError {
    /// Document carries a schema version this build does not understand.
    /// Unknown versions are rejected, never coerced.
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),

    /// Document violates a structural invariant.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
