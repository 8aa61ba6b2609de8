//! HTTP error mapping.

use std::fmt;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use netmap_discover::{DaemonError, RenderError};
use netmap_inventory::InventoryError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body shared by every route: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Lifecycle requests that do not fit the current state are conflicts.
impl From<DaemonError> for ApiError {
    fn from(err: DaemonError) -> Self {
        Self::conflict(err.to_string())
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        if err.is_not_found() {
            Self::not_found(err.to_string())
        } else {
            Self::conflict(err.to_string())
        }
    }
}

/// Malformed or missing request bodies keep axum's status and message.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// Render failures are logged in detail; clients get a fixed message.
impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        tracing::error!(error = %err, "Graph rendering failed");
        Self::internal("Failed to generate topology graph")
    }
}
