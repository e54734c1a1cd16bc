//! Sync Agent - Main entry point
//!
//! HTTP-triggered incremental sync between a drive folder and an object
//! store bucket.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use sync_agent::{api, config::Config, daemon::shutdown::ShutdownCoordinator, utils};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    // Initialize start time for uptime tracking
    api::health::init_start_time();

    tracing::info!(
        "Starting sync-agent v{} (folder: {}, bucket: {})",
        env!("CARGO_PKG_VERSION"),
        config.remote.folder_id,
        config.storage.bucket
    );

    // Determine port
    let port = args.port.unwrap_or(config.server.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    // Create shutdown coordinator; its token cancels in-flight passes
    let shutdown_coordinator = ShutdownCoordinator::new();

    // Create shared app state and router
    let app_state = api::create_app_state(config, shutdown_coordinator.token());
    let app = api::create_router(app_state);

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health endpoint: http://{}/health", addr);
    tracing::info!("Sync trigger: POST http://{}/sync", addr);

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_coordinator.wait_for_signal().await;
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
