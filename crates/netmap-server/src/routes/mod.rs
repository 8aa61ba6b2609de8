//! Route table.

mod inventory;
mod topology;

use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;

use crate::state::AppState;

pub use topology::{IntervalRequest, MessageResponse, StartRequest, StartResponse};

/// Build the axum router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route(
            "/topologia",
            get(topology::handle_get)
                .post(topology::handle_start)
                .put(topology::handle_set_interval)
                .delete(topology::handle_stop),
        )
        .route("/topologia/status", get(topology::handle_status))
        .route("/topologia/graph", get(topology::handle_graph))
        .route(
            "/usuarios",
            get(inventory::list_users).post(inventory::create_user),
        )
        .route(
            "/usuarios/{username}",
            put(inventory::update_user).delete(inventory::delete_user),
        )
        .route("/routers", get(inventory::list_routers))
        .route("/routes", get(inventory::list_routers))
        .route("/routers/{hostname}", get(inventory::get_router))
        .route("/routers/{hostname}/interfaces", get(inventory::get_interfaces))
        .route(
            "/routers/{hostname}/usuarios",
            get(inventory::list_router_users)
                .post(inventory::add_router_user)
                .put(inventory::update_router_user)
                .delete(inventory::delete_router_user),
        )
        .with_state(state)
}

async fn handle_home() -> &'static str {
    "Network API is running"
}
