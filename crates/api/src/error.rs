//! API Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use storage::StorageError;
use thiserror::Error;
use tracing::{error, warn};

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the student endpoints.
///
/// Responses carry only the status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No student with the requested id
    #[error("Student {0} not found")]
    NotFound(i64),

    /// Path id and body id disagree on update
    #[error("Path id {path} does not match body id {body}")]
    IdMismatch { path: i64, body: i64 },

    /// Store failure
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Storage(other),
        }
    }
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::IdMismatch { .. } => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        status.into_response()
    }
}
