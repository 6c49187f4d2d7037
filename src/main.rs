use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use subdomain_router::config::Config;
use subdomain_router::proxy::ProxyServer;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subdomain_router=debug".parse().expect("valid log directive")),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path.display(), error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        path = %config_path.display(),
        host = %config.host,
        subdomains = config.subdomains.len(),
        fallback = ?config.fallback_port,
        "Configuration loaded"
    );

    let bind_addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| {
            error!(bind = %config.server.bind, port = config.server.port, error = %e, "Invalid bind address");
            anyhow::anyhow!("Invalid bind address: {}", e)
        })?;

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = ProxyServer::new(bind_addr, Arc::new(config), shutdown_rx);
    let server_handle = tokio::spawn(server.run());

    // Wait for shutdown signal (Ctrl+C)
    tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    server_handle.await??;

    Ok(())
}
