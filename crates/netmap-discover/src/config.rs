//! Configuration for the topology discovery daemon.

use std::time::Duration;

use serde::Deserialize;

/// Discovery configuration.
///
/// Loaded from the `[discover]` section of `netmap.toml` or
/// `NETMAP__DISCOVER__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Scan profile used by the daemon.
    #[serde(default)]
    pub profile: ScanProfile,

    /// Initial polling interval in seconds. Changed at runtime via the controller.
    #[serde(default = "default_interval")]
    pub interval_secs: i64,

    /// Range scanned when a start request does not name one.
    #[serde(default = "default_network_range")]
    pub default_network_range: String,

    /// A single nmap run is abandoned after this many seconds.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,

    /// Link every discovered host to the range's gateway address.
    #[serde(default = "default_true")]
    pub infer_gateway_links: bool,
}

impl DiscoverConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

/// Predefined scan profiles mapping to nmap flag sets.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanProfile {
    /// Ping sweep only: `-sn`
    #[default]
    Quick,
    /// SYN scan + service version, top 1000 ports: `-sS -sV`
    Standard,
    /// Full scan: `-sS -sV -O -A -p-`
    Deep,
}

impl ScanProfile {
    /// Return the nmap flags for this profile.
    pub fn nmap_flags(&self) -> Vec<&'static str> {
        match self {
            Self::Quick => vec!["-sn"],
            Self::Standard => vec!["-sS", "-sV", "--top-ports", "1000"],
            Self::Deep => vec!["-sS", "-sV", "-O", "-A", "-p-"],
        }
    }
}

impl std::str::FromStr for ScanProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "standard" => Ok(Self::Standard),
            "deep" => Ok(Self::Deep),
            _ => Err(format!("invalid profile: {s}. Choose: quick, standard, deep")),
        }
    }
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_interval() -> i64 {
    300
}

fn default_network_range() -> String {
    "192.168.1.0/24".to_string()
}

fn default_scan_timeout() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            profile: ScanProfile::default(),
            interval_secs: default_interval(),
            default_network_range: default_network_range(),
            scan_timeout_secs: default_scan_timeout(),
            infer_gateway_links: default_true(),
        }
    }
}
