//! Error taxonomy for the sampling and storage layer.
//!
//! `SensorRead` and `DatastoreWrite` are transient and contained by the
//! sampling loop. `DatastoreInit` and `Config` are fatal at startup.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by thermolog components.
#[derive(Error, Debug)]
pub enum Error {
    /// Sensor did not produce a sample.
    #[error("Sensor read failed: {0}")]
    SensorRead(#[from] thermolog_hw::Error),

    /// The blocking sensor read panicked or was cancelled.
    #[error("Sensor task failed: {0}")]
    SensorTask(#[from] tokio::task::JoinError),

    /// A reading could not be persisted.
    #[error("Failed to store reading: {0}")]
    DatastoreWrite(#[source] sqlx::Error),

    /// Readings could not be queried.
    #[error("Failed to query readings: {0}")]
    DatastoreRead(#[source] sqlx::Error),

    /// Database file could not be opened or its schema created.
    #[error("Failed to initialize database {path}: {source}")]
    DatastoreInit {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    /// Missing or malformed configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
