//! Shared state handed to every route handler.

use std::sync::Arc;

use netmap_discover::{DaemonController, PngRenderer, Prober, Renderer, TopologyStore};
use netmap_inventory::{RouterStore, UserStore};

use crate::config::AppConfig;

pub struct AppState {
    pub daemon: DaemonController,
    pub renderer: Arc<dyn Renderer>,
    pub users: UserStore,
    pub routers: RouterStore,
    /// Range scanned when a start request names none.
    pub default_network_range: String,
}

impl AppState {
    pub fn new(daemon: DaemonController, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            daemon,
            renderer,
            users: UserStore::new(),
            routers: RouterStore::with_sample_data(),
            default_network_range: "192.168.1.0/24".to_string(),
        }
    }

    pub fn with_default_network_range(mut self, range: impl Into<String>) -> Self {
        self.default_network_range = range.into();
        self
    }

    /// Wire the file-backed store, PNG renderer and daemon from configuration.
    pub fn from_config(config: &AppConfig, prober: Arc<dyn Prober>) -> Self {
        let store = Arc::new(TopologyStore::open(&config.server.topology_path));
        let daemon = DaemonController::new(prober, store, config.discover.interval_secs);
        let renderer = Arc::new(PngRenderer::new(&config.server.static_dir));

        Self::new(daemon, renderer)
            .with_default_network_range(&config.discover.default_network_range)
    }

    pub fn store(&self) -> &Arc<TopologyStore> {
        self.daemon.store()
    }
}
