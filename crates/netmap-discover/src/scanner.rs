//! Nmap process wrapper.
//!
//! Executes nmap as a child process via `tokio::process::Command`, parses the
//! XML output, and converts the reported hosts into a `Topology`.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ipnet::IpNet;
use tokio::process::Command;
use uuid::Uuid;

use netmap_core::{Connection, Device, Topology};

use crate::config::{DiscoverConfig, ScanProfile};
use crate::error::{Result, ScanError};
use crate::nmap_xml::{self, NmapRun};
use crate::prober::Prober;

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
    profile: ScanProfile,
    timeout: Duration,
    infer_gateway_links: bool,
}

impl NmapScanner {
    pub fn new(nmap_path: &str) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
            profile: ScanProfile::default(),
            timeout: Duration::from_secs(600),
            infer_gateway_links: true,
        }
    }

    pub fn from_config(config: &DiscoverConfig) -> Self {
        Self::new(&config.nmap_path)
            .with_profile(config.profile.clone())
            .with_timeout(config.scan_timeout())
            .with_gateway_links(config.infer_gateway_links)
    }

    pub fn with_profile(mut self, profile: ScanProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_gateway_links(mut self, enabled: bool) -> Self {
        self.infer_gateway_links = enabled;
        self
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| ScanError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        String::from_utf8(output.stdout).map_err(|e| ScanError::Other(e.to_string()))
    }

    /// Run nmap against `target` and return the parsed XML.
    ///
    /// Nmap is invoked with `-oX -` to write XML to stdout. The child is
    /// killed if the scan exceeds the configured timeout.
    async fn run_nmap(&self, target: &str) -> Result<NmapRun> {
        let mut cmd = Command::new(&self.nmap_path);
        cmd.args(self.profile.nmap_flags())
            .arg("-oX")
            .arg("-")
            .arg("--noninteractive")
            .arg(target)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ScanError::Timeout {
                target: target.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ScanError::NmapNotFound {
                path: format!("{}: {e}", self.nmap_path),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ScanError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        nmap_xml::parse_nmap_xml(&output.stdout)
    }
}

#[async_trait]
impl Prober for NmapScanner {
    async fn scan(&self, range: &str) -> Result<Topology> {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        tracing::info!(
            scan_id = %scan_id,
            target = %range,
            profile = ?self.profile,
            "Starting nmap scan"
        );

        let nmap_run = self.run_nmap(range).await?;
        let topology = build_topology(&nmap_run, range, self.infer_gateway_links);

        tracing::info!(
            scan_id = %scan_id,
            target = %range,
            devices = topology.devices.len(),
            connections = topology.connections.len(),
            duration_ms = start.elapsed().as_millis(),
            "Nmap scan complete"
        );

        Ok(topology)
    }
}

/// Convert nmap output into a topology.
///
/// Every host with an IPv4 address becomes a device. When `gateway_links` is
/// set and `range` is a CIDR network whose first host address was seen, that
/// host is linked to every other device.
pub fn build_topology(nmap_run: &NmapRun, range: &str, gateway_links: bool) -> Topology {
    let devices: Vec<Device> = nmap_run
        .hosts
        .iter()
        .filter_map(|h| {
            let ip = h.ipv4()?;
            Some(Device::new(ip, h.hostname().unwrap_or_default(), h.state()))
        })
        .collect();

    let connections = if gateway_links {
        gateway_of(range)
            .map(|gw| gateway_connections(&devices, &gw.to_string()))
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Topology::new(devices, connections)
}

/// First host address of a CIDR range, e.g. `192.168.1.1` for `192.168.1.0/24`.
fn gateway_of(range: &str) -> Option<IpAddr> {
    let net: IpNet = range.trim().parse().ok()?;
    net.hosts().next()
}

fn gateway_connections(devices: &[Device], gateway: &str) -> Vec<Connection> {
    if !devices.iter().any(|d| d.ip == gateway) {
        return Vec::new();
    }

    devices
        .iter()
        .filter(|d| d.ip != gateway)
        .map(|d| Connection::new(gateway, d.ip.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWEEP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="nmap -sn 10.0.1.0/24">
  <host>
    <status state="up" reason="arp-response"/>
    <address addr="10.0.1.1" addrtype="ipv4"/>
    <hostnames><hostname name="gw.lab" type="PTR"/></hostnames>
  </host>
  <host>
    <status state="up" reason="arp-response"/>
    <address addr="10.0.1.10" addrtype="ipv4"/>
    <address addr="AA:BB:CC:DD:EE:10" addrtype="mac"/>
  </host>
  <host>
    <status state="up" reason="arp-response"/>
    <address addr="AA:BB:CC:DD:EE:99" addrtype="mac"/>
  </host>
  <host>
    <status state="up" reason="syn-ack"/>
    <address addr="10.0.1.20" addrtype="ipv4"/>
    <hostnames><hostname name="nas.lab" type="PTR"/></hostnames>
  </host>
</nmaprun>"#;

    fn sweep() -> NmapRun {
        nmap_xml::parse_nmap_xml(SWEEP_XML.as_bytes()).unwrap()
    }

    #[test]
    fn test_devices_from_hosts() {
        let topo = build_topology(&sweep(), "10.0.1.0/24", false);

        assert_eq!(topo.devices.len(), 3);
        assert_eq!(topo.devices[0], Device::new("10.0.1.1", "gw.lab", "up"));
        assert_eq!(topo.devices[1], Device::new("10.0.1.10", "", "up"));
        assert_eq!(topo.devices[2].hostname, "nas.lab");
        assert!(topo.connections.is_empty());
    }

    #[test]
    fn test_gateway_star() {
        let topo = build_topology(&sweep(), "10.0.1.0/24", true);

        assert_eq!(
            topo.connections,
            vec![
                Connection::new("10.0.1.1", "10.0.1.10"),
                Connection::new("10.0.1.1", "10.0.1.20"),
            ]
        );
        assert_eq!(topo.dangling_connections().count(), 0);
    }

    #[test]
    fn test_no_links_without_gateway() {
        // 10.0.2.1 is the gateway of this range and was not seen.
        let topo = build_topology(&sweep(), "10.0.2.0/24", true);
        assert!(topo.connections.is_empty());
    }

    #[test]
    fn test_no_links_for_non_cidr_target() {
        let topo = build_topology(&sweep(), "10.0.1.1-20", true);
        assert_eq!(topo.devices.len(), 3);
        assert!(topo.connections.is_empty());
    }

    #[test]
    fn test_gateway_of() {
        assert_eq!(
            gateway_of("192.168.1.0/24"),
            Some("192.168.1.1".parse().unwrap())
        );
        assert_eq!(gateway_of("scanme.nmap.org"), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_scan_error() {
        let scanner = NmapScanner::new("/nonexistent/nmap-binary");
        let err = scanner.scan("127.0.0.1/32").await.unwrap_err();
        assert!(matches!(err, ScanError::NmapNotFound { .. }));
    }
}
