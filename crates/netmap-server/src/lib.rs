//! netmap-server: HTTP API over the discovery daemon and inventory stores.
//!
//! Routes:
//! - `/topologia` read the latest snapshot and drive the daemon lifecycle
//! - `/topologia/graph` render the current topology as PNG
//! - `/usuarios`, `/routers` inventory CRUD

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
