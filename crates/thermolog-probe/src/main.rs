//! thermolog probe
//!
//! Samples the attached temperature/humidity sensor on a fixed interval,
//! appends each reading to the SQLite database and serves `/health`.

mod web;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use thermolog_core::config::DEFAULT_CONFIG_PATH;
use thermolog_core::{Config, Datastore, HealthMonitor, SamplingLoop};

#[derive(Parser)]
#[command(name = "thermolog-probe")]
#[command(about = "Samples a temperature/humidity sensor into SQLite")]
#[command(version)]
struct Cli {
    /// Configuration file (KEY=value lines)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config_path, required) = match cli.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let config = Config::load(&config_path, required).context("Failed to load configuration")?;

    // Setup logging
    let log_file = config
        .log_file
        .as_deref()
        .map(open_log_file)
        .transpose()?;
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with(fmt::layer())
        .with(log_file.map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file))))
        .init();

    info!(
        "Starting probe with sensor={} interval={}s db={}",
        config.sensor,
        config.sample_interval_secs,
        config.db_path.display()
    );

    let sensor = thermolog_hw::open(config.sensor, &config.i2c_bus)
        .context("Failed to initialize sensor")?;
    let store = Datastore::open(&config.db_path)
        .await
        .context("Failed to open database")?;

    // Continue after the newest stored row even if the clock is behind it
    let last = store
        .latest()
        .await
        .context("Failed to read latest reading")?
        .map(|reading| reading.timestamp);
    if let Some(last) = last.filter(|last| *last > chrono::Utc::now()) {
        warn!(
            "Newest reading in {} is from {}, ahead of the system clock",
            store.path().display(),
            last
        );
    }

    // Start sampling loop
    let health = Arc::new(HealthMonitor::new(config.sample_interval()));
    let sampler = SamplingLoop::new(sensor, store, config.sample_interval(), health.clone())
        .with_last_timestamp(last);
    tokio::spawn(sampler.run());

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    let app = web::create_router(health);
    let addr = config.health_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind health endpoint on {}", addr))?;
    info!("Health endpoint listening on http://{}/health", addr);

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

/// Opens the log file for appending, creating it if needed.
fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
