//! Request extractors whose rejections use the shared error body.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` with rejections reported as `{"error": ...}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
