//! netmap-discover: Topology discovery for netmap.
//!
//! Wraps nmap to sweep a network range, keeps the latest result in a
//! persisted store, runs the periodic discovery daemon, and renders the
//! current topology as an image.

pub mod config;
pub mod daemon;
pub mod error;
pub mod nmap_xml;
pub mod prober;
pub mod render;
pub mod scanner;
pub mod store;

pub use daemon::{DaemonController, DaemonStatus};
pub use error::{DaemonError, RenderError, ScanError, StoreError};
pub use prober::Prober;
pub use render::{render_current, PngRenderer, Renderer};
pub use scanner::NmapScanner;
pub use store::TopologyStore;
