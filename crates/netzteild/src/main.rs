//! netzteild - Netzteil Daemon
//!
//! Serves the configured bench power supplies over HTTP and WebSocket.
//!
//! Usage:
//!   netzteild [-c config.toml] [-b 0.0.0.0:8000] [-v]
//!
//! Without `--config` the daemon reads `<user config dir>/netzteil/config.toml`
//! and falls back to a single simulated supply when that file does not exist.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use netzteil_api::{create_router, AppState};
use netzteil_devices::build_registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "netzteild")]
#[command(version, about = "HTTP/WebSocket gateway for bench power supplies")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "NETZTEIL_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides [http] bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Debug logging for all netzteil crates
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "netzteild=debug,netzteil_api=debug,netzteil_devices=debug,tower_http=debug"
    } else {
        "netzteild=info,netzteil_api=info,netzteil_devices=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting netzteild (power supply gateway)");

    let config = config::load(args.config.as_deref())?;

    let registry = build_registry(&config.devices)
        .await
        .context("Failed to initialise devices")?;
    tracing::info!(devices = registry.len(), "All devices ready");

    let state = AppState::new(registry)
        .with_request_timeout(Duration::from_secs(config.http.request_timeout_secs));
    let app = create_router(state);

    let bind = args.bind.unwrap_or(config.http.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
