//! Server entry point.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use netmap_discover::NmapScanner;
use netmap_server::{router, AppConfig, AppState};

#[derive(Parser)]
#[command(name = "netmap-server")]
#[command(about = "Network inventory and topology discovery API")]
struct Cli {
    /// Config file name without extension.
    #[arg(short, long, default_value = "netmap")]
    config: String,

    /// Override the listen address (e.g. 127.0.0.1:5000).
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }

    let scanner = NmapScanner::from_config(&config.discover);
    match scanner.verify_installation().await {
        Ok(version) => tracing::info!(
            version = version.lines().next().unwrap_or_default(),
            "nmap available"
        ),
        Err(e) => tracing::warn!(error = %e, "nmap unavailable; scans will record errors"),
    }

    let state = Arc::new(AppState::from_config(&config, Arc::new(scanner)));
    let app = router(state.clone());

    let listener = TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!(
        addr = %config.server.listen_addr,
        topology_path = %config.server.topology_path.display(),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if state.daemon.is_running().await {
        state.daemon.stop().await?;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
