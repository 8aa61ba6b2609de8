//! Global users and router inventory.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use netmap_core::{Interface, Router, RouterUser, User};
use netmap_inventory::UserUpdate;

use super::MessageResponse;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct UpdateUserRequest {
    permissions: Option<String>,
    devices: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveRouterUserRequest {
    username: String,
}

pub(super) async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.users.list())
}

pub(super) async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(user): JsonBody<User>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.add(user)?))
}

pub(super) async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let update = UserUpdate {
        permissions: req.permissions,
        devices: req.devices,
    };
    Ok(Json(state.users.update(&username, update)?))
}

pub(super) async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.users.delete(&username)?;
    Ok(MessageResponse::new(format!("User '{username}' deleted")))
}

pub(super) async fn list_routers(State(state): State<Arc<AppState>>) -> Json<Vec<Router>> {
    Json(state.routers.list())
}

pub(super) async fn get_router(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
) -> ApiResult<Json<Router>> {
    Ok(Json(state.routers.get(&hostname)?))
}

pub(super) async fn get_interfaces(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
) -> ApiResult<Json<Vec<Interface>>> {
    match state.routers.interfaces(&hostname) {
        Ok(interfaces) if !interfaces.is_empty() => Ok(Json(interfaces)),
        _ => Err(ApiError::not_found("Router not found or has no interfaces")),
    }
}

pub(super) async fn list_router_users(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
) -> ApiResult<Json<Vec<RouterUser>>> {
    Ok(Json(state.routers.users(&hostname)?))
}

pub(super) async fn add_router_user(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
    JsonBody(user): JsonBody<RouterUser>,
) -> ApiResult<Json<RouterUser>> {
    Ok(Json(state.routers.add_user(&hostname, user)?))
}

pub(super) async fn update_router_user(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
    JsonBody(user): JsonBody<RouterUser>,
) -> ApiResult<Json<RouterUser>> {
    let updated = state
        .routers
        .update_user(&hostname, &user.username, &user.permissions)?;
    Ok(Json(updated))
}

pub(super) async fn delete_router_user(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
    JsonBody(req): JsonBody<RemoveRouterUserRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.routers.delete_user(&hostname, &req.username)?;
    Ok(MessageResponse::new(format!(
        "User '{}' deleted from router '{hostname}'",
        req.username
    )))
}
