//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rasterization.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An asset could not be decoded or prepared for painting.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Building or rasterizing the face output failed.
    #[error("Export failed: {0}")]
    Export(String),
}
