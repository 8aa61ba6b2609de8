//! Service configuration.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`NETMAP__` prefix, `__` between keys)
//! 2. Config file (`netmap.toml` unless another prefix is given)
//! 3. Defaults

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use netmap_discover::config::DiscoverConfig;

/// HTTP listener and on-disk locations.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default: "0.0.0.0:5000").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Canonical path of the persisted topology document.
    #[serde(default = "default_topology_path")]
    pub topology_path: PathBuf,

    /// Directory rendered graphs are written to.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_topology_path() -> PathBuf {
    PathBuf::from("current_topology.json")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            topology_path: default_topology_path(),
            static_dir: default_static_dir(),
        }
    }
}

/// Top-level configuration: `[server]` and `[discover]` sections.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub discover: DiscoverConfig,
}

impl AppConfig {
    /// Load from `<file_prefix>.toml` (optional) and `NETMAP__*` variables.
    pub fn load(file_prefix: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::with_name(file_prefix).required(false))
            .add_source(
                Environment::with_prefix("NETMAP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(Self {
            server: section(&cfg, "server")?,
            discover: section(&cfg, "discover")?,
        })
    }
}

/// Deserialize one section, falling back to defaults when it is absent.
fn section<T: DeserializeOwned + Default>(cfg: &Config, key: &str) -> Result<T, ConfigError> {
    match cfg.get::<T>(key) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(e),
    }
}
