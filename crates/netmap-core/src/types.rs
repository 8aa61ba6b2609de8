//! Topology types produced by a discovery scan.
//!
//! A scan yields a `Topology` (devices plus the links between them). The
//! daemon stores the outcome of every cycle as a `Snapshot`, which is either
//! that topology or the error message of the failed scan. The JSON shapes are
//! the persisted document format:
//!
//! ```text
//! {"devices": [{"ip": "...", "hostname": "...", "state": "up"}], "connections": [{"from": "...", "to": "..."}]}
//! {"error": "nmap exited with code 1: ..."}
//! ```

use serde::{Deserialize, Serialize};

// ── Devices ───────────────────────────────────────────────────────

/// A host observed by a scan. Identified by `ip`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Device {
    pub ip: String,
    /// Reverse-DNS name reported by the prober, empty when none was found.
    #[serde(default)]
    pub hostname: String,
    /// Reachability state as reported by the prober (e.g. "up").
    pub state: String,
}

impl Device {
    pub fn new(ip: impl Into<String>, hostname: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            hostname: hostname.into(),
            state: state.into(),
        }
    }

    /// Display label: the hostname, or the IP when no hostname is known.
    pub fn label(&self) -> &str {
        if self.hostname.is_empty() {
            &self.ip
        } else {
            &self.hostname
        }
    }
}

/// An undirected link between two device IPs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

impl Connection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ── Topology ──────────────────────────────────────────────────────

/// The complete result of one successful scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topology {
    pub devices: Vec<Device>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Topology {
    pub fn new(devices: Vec<Device>, connections: Vec<Connection>) -> Self {
        Self {
            devices,
            connections,
        }
    }

    /// Look up a device by IP.
    pub fn device(&self, ip: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.ip == ip)
    }

    /// Connections with at least one endpoint that is not a known device.
    ///
    /// These are kept as reported; callers decide whether to skip them.
    pub fn dangling_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(|c| self.device(&c.from).is_none() || self.device(&c.to).is_none())
    }
}

// ── Snapshot ──────────────────────────────────────────────────────

/// The stored outcome of one scan cycle.
///
/// Snapshots are immutable once stored: a new cycle replaces the previous
/// snapshot wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Snapshot {
    /// The scan succeeded.
    Topology(Topology),
    /// The scan failed; carries the error message.
    Failed { error: String },
}

impl Snapshot {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// The topology, if the scan succeeded.
    pub fn topology(&self) -> Option<&Topology> {
        match self {
            Self::Topology(t) => Some(t),
            Self::Failed { .. } => None,
        }
    }

    /// The error message, if the scan failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Topology(_) => None,
            Self::Failed { error } => Some(error),
        }
    }
}

impl From<Topology> for Snapshot {
    fn from(topology: Topology) -> Self {
        Self::Topology(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_topology() -> Topology {
        Topology::new(
            vec![
                Device::new("192.168.1.1", "gateway.local", "up"),
                Device::new("192.168.1.20", "", "up"),
            ],
            vec![Connection::new("192.168.1.1", "192.168.1.20")],
        )
    }

    #[test]
    fn topology_snapshot_json_shape() {
        let snapshot = Snapshot::from(sample_topology());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["devices"][0]["ip"], "192.168.1.1");
        assert_eq!(json["devices"][1]["hostname"], "");
        assert_eq!(json["connections"][0]["from"], "192.168.1.1");
        assert_eq!(json["connections"][0]["to"], "192.168.1.20");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failed_snapshot_json_shape() {
        let snapshot = Snapshot::failed("nmap not found");
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"error":"nmap not found"}"#);

        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.error(), Some("nmap not found"));
        assert!(parsed.topology().is_none());
    }

    #[test]
    fn snapshot_parses_both_document_forms() {
        let ok: Snapshot = serde_json::from_str(
            r#"{"devices":[{"ip":"10.0.0.1","hostname":"r1","state":"up"}],"connections":[]}"#,
        )
        .unwrap();
        assert_eq!(ok.topology().unwrap().devices.len(), 1);

        let failed: Snapshot = serde_json::from_str(r#"{"error":"timeout"}"#).unwrap();
        assert_eq!(failed, Snapshot::failed("timeout"));
    }

    #[test]
    fn bare_device_list_is_rejected() {
        let legacy = r#"[{"ip":"10.0.0.1","hostname":"","state":"up"}]"#;
        assert!(serde_json::from_str::<Snapshot>(legacy).is_err());
    }

    #[test]
    fn device_label_falls_back_to_ip() {
        let topo = sample_topology();
        assert_eq!(topo.devices[0].label(), "gateway.local");
        assert_eq!(topo.devices[1].label(), "192.168.1.20");
    }

    #[test]
    fn dangling_connections_are_reported() {
        let mut topo = sample_topology();
        assert_eq!(topo.dangling_connections().count(), 0);

        topo.connections
            .push(Connection::new("192.168.1.1", "192.168.1.99"));
        let dangling: Vec<_> = topo.dangling_connections().collect();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].to, "192.168.1.99");
    }
}
