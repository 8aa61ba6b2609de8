//! CLI entry point for a one-shot topology scan.
//!
//! Prints the resulting snapshot as JSON on stdout, or persists it through a
//! topology store with `--output`. Logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use netmap_core::Snapshot;
use netmap_discover::config::{DiscoverConfig, ScanProfile};
use netmap_discover::{NmapScanner, Prober, TopologyStore};

#[derive(Parser)]
#[command(name = "netmap-discover")]
#[command(about = "Scan a network range once and report its topology")]
struct Cli {
    /// Target to scan (CIDR notation, e.g., 192.168.1.0/24).
    #[arg(short, long)]
    target: String,

    /// Scan profile: quick, standard, deep.
    #[arg(short, long, default_value = "quick")]
    profile: ScanProfile,

    /// Path to the nmap binary.
    #[arg(long, default_value = "nmap")]
    nmap_path: String,

    /// Persist the snapshot to this file instead of printing it.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = DiscoverConfig {
        nmap_path: cli.nmap_path,
        profile: cli.profile,
        ..Default::default()
    };
    let scanner = NmapScanner::from_config(&config);

    let snapshot = match scanner.scan(&cli.target).await {
        Ok(topology) => Snapshot::from(topology),
        Err(e) => {
            tracing::error!(target = %cli.target, error = %e, "Scan failed");
            Snapshot::failed(e.to_string())
        }
    };

    match cli.output {
        Some(path) => {
            TopologyStore::open(&path).set(snapshot)?;
            tracing::info!(path = %path.display(), "Snapshot written");
        }
        None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }

    Ok(())
}
