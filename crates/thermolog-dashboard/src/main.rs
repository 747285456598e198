//! thermolog dashboard
//!
//! Web server charting the readings stored by the probe.

mod rendering;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use thermolog_core::config::DEFAULT_CONFIG_PATH;
use thermolog_core::{Config, Datastore};
use web::AppState;

#[derive(Parser)]
#[command(name = "thermolog-dashboard")]
#[command(about = "Web dashboard for thermolog readings")]
#[command(version)]
struct Cli {
    /// Configuration file (KEY=value lines)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let (config_path, required) = match cli.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let config = Config::load(&config_path, required).context("Failed to load configuration")?;

    // The writer owns the file; never create or migrate it here
    let store = Datastore::open_existing(&config.db_path)
        .await
        .context("Failed to open database")?;
    let readings = store
        .count()
        .await
        .context("Failed to count readings")?;
    info!("Serving {} readings from {}", readings, store.path().display());
    let state = Arc::new(AppState {
        store,
        sample_interval: config.sample_interval(),
    });

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    let app = web::create_router(state);
    let addr = config.web_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard on {}", addr))?;
    info!("Dashboard listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    Ok(())
}
