//! Bridge Server - standalone headless server for the audio-reactive lighting bridge.
//!
//! This binary wires the core crate's bootstrap sequence to process
//! lifetime: it loads configuration, starts the reactive pipeline, serves
//! the thin status surface, and shuts down cleanly on signal.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// Headless audio-reactive lighting bridge server.
#[derive(Parser, Debug)]
#[command(name = "bridge-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "BRIDGE_LOG_LEVEL")]
    log_level: tracing::Level,

    /// Status surface bind port (overrides config file).
    #[arg(short = 'p', long, env = "BRIDGE_BIND_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bridge-server starting");

    let mut config =
        ServerConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.bind_port = port;
    }

    let bootstrap_config = config
        .load_bootstrap_config()
        .context("failed to load bootstrap configuration")?;

    let services = bridge_core::bootstrap_services(bootstrap_config)
        .context("failed to bootstrap services")?;

    services.start().context("failed to start reactive pipeline")?;
    tracing::info!("reactive pipeline started");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.bind_port))
        .await
        .with_context(|| format!("failed to bind status surface on port {}", config.bind_port))?;
    tracing::info!(port = config.bind_port, "status surface listening");

    let status_app = bridge_core::status::router(std::sync::Arc::clone(&services));
    let server_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, status_app).await {
            tracing::error!(error = %err, "status surface error");
        }
    });

    shutdown_signal().await;
    tracing::info!("shutdown signal received, cleaning up");

    services.stop().await;
    server_handle.abort();

    tracing::info!("shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
