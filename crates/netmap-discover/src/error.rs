//! Error types for the netmap-discover crate.

use thiserror::Error;

/// A probe of the network range failed.
///
/// Never fatal to the polling loop: the message is recorded as a failed
/// snapshot and the next cycle runs on schedule.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(String),

    #[error("Scan of {target} timed out after {secs}s")]
    Timeout { target: String, secs: u64 },

    #[error("Probe failed: {0}")]
    Other(String),
}

/// Reading or writing the persisted snapshot failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Producing a picture of the current topology failed.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No topology has been recorded yet")]
    NoData,

    #[error("Last scan failed: {0}")]
    ScanFailed(String),

    #[error("SVG error: {0}")]
    Svg(String),

    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle conflicts reported by the daemon controller.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DaemonError {
    #[error("Daemon is already running")]
    AlreadyRunning,

    #[error("Daemon is not running")]
    NotRunning,
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
