//! Service error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use card_core::DesignError;
use card_renderer::RenderError;

use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No authenticated user on the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// The resource does not exist for this caller.
    ///
    /// One generic class on purpose: external callers must not be able to
    /// distinguish "doesn't exist" from "exists but not yours".
    #[error("Not found")]
    NotFound,

    /// The request payload failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A stored document carries an unsupported schema version.
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),

    /// Object or record storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Face rasterization failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DesignError> for ServiceError {
    fn from(err: DesignError) -> Self {
        match err {
            DesignError::UnsupportedVersion(version) => Self::UnsupportedVersion(version),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedVersion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) | Self::Render(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal detail stays in the logs, not in the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
