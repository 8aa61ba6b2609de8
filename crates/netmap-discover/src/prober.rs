//! The probing capability consumed by the discovery daemon.
//!
//! The daemon does not know how a range is probed; it only calls
//! [`Prober::scan`] once per cycle and records whatever comes back.

use async_trait::async_trait;
use netmap_core::Topology;

use crate::error::Result;

/// Sweeps a network range and reports the devices and links found.
///
/// A call may take as long as the underlying probe takes. The daemon does not
/// retry failed calls.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn scan(&self, range: &str) -> Result<Topology>;
}
