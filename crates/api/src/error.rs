//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::{debug, error};

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input failed a check before reaching the store
    #[error("{0}")]
    Validation(String),

    /// The store could not complete the operation
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The page template failed to render
    #[error("Render error: {0}")]
    Render(String),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match &self {
            ApiError::Validation(message) => {
                debug!("Rejected request: {}", message);
                message.clone()
            }
            ApiError::Storage(_) | ApiError::Render(_) => {
                error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
