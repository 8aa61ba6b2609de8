//! Topology read, daemon lifecycle and graph rendering.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use netmap_discover::{render_current, DaemonStatus, RenderError};

use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub network_range: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
    pub interval: i64,
}

#[derive(Debug, Deserialize)]
pub struct IntervalRequest {
    #[serde(default = "default_interval")]
    pub interval: i64,
}

fn default_interval() -> i64 {
    300
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Current snapshot, or `[]` before the first scan completes.
pub(super) async fn handle_get(State(state): State<Arc<AppState>>) -> Response {
    match state.store().get() {
        Some(snapshot) => Json(&*snapshot).into_response(),
        None => Json(serde_json::json!([])).into_response(),
    }
}

pub(super) async fn handle_start(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<StartRequest>,
) -> ApiResult<Json<StartResponse>> {
    let range = req
        .network_range
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| state.default_network_range.clone());

    let interval = state.daemon.start(&range).await?;
    Ok(Json(StartResponse {
        message: "Daemon started".to_string(),
        interval,
    }))
}

pub(super) async fn handle_set_interval(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<IntervalRequest>,
) -> Json<MessageResponse> {
    let interval = state.daemon.set_interval(req.interval).await;
    MessageResponse::new(format!("Interval set to {interval} seconds"))
}

pub(super) async fn handle_stop(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MessageResponse>> {
    state.daemon.stop().await?;
    Ok(MessageResponse::new("Daemon stopped"))
}

pub(super) async fn handle_status(State(state): State<Arc<AppState>>) -> Json<DaemonStatus> {
    Json(state.daemon.status().await)
}

/// Render the current topology and return it as `image/png`.
pub(super) async fn handle_graph(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let store = state.store().clone();
    let renderer = state.renderer.clone();

    let path = tokio::task::spawn_blocking(move || render_current(&store, renderer.as_ref()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Render task failed");
            ApiError::internal("Failed to generate topology graph")
        })??;

    let bytes = tokio::fs::read(&path).await.map_err(RenderError::from)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
