//! SQLite readings store.
//!
//! A single append-only `readings` table. The sampling process opens the
//! file with [`Datastore::open`] and is the only writer. The dashboard attaches to the
//! same file read-only through [`Datastore::open_existing`]. SQLite's WAL
//! locking is the only coordination between them.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::reading::{format_timestamp, parse_timestamp, Reading};
use crate::{Error, Result};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    temperature REAL NOT NULL,
    humidity REAL NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS readings_timestamp ON readings (timestamp)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for readings produced by the sampling loop.
pub trait ReadingStore: Send + Sync {
    /// Appends one reading.
    fn append(&self, reading: &Reading) -> impl Future<Output = Result<()>> + Send;
}

/// Handle to the readings database.
#[derive(Debug, Clone)]
pub struct Datastore {
    pool: SqlitePool,
    path: PathBuf,
}

impl Datastore {
    /// Opens the database file, creating it if needed, and bootstraps the
    /// schema.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|source| Error::DatastoreInit {
                path: path.display().to_string(),
                source,
            })?;

        let store = Self { pool, path };
        store.bootstrap().await?;
        info!("Opened database {}", store.path.display());
        Ok(store)
    }

    /// Opens an existing database file read-only.
    ///
    /// Nothing is created: a missing file or a file that was never
    /// bootstrapped is reported instead of silently replaced.
    pub async fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false)
            .read_only(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|source| Error::DatastoreInit {
                path: path.display().to_string(),
                source,
            })?;

        let store = Self { pool, path };
        store.ping().await.map_err(|e| match e {
            Error::DatastoreRead(source) => Error::DatastoreInit {
                path: store.path.display().to_string(),
                source,
            },
            other => other,
        })?;
        info!("Opened database {} read-only", store.path.display());
        Ok(store)
    }

    /// Creates the readings table and index if they are absent.
    ///
    /// Safe to run against a populated file.
    pub async fn bootstrap(&self) -> Result<()> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|source| Error::DatastoreInit {
                    path: self.path.display().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts one reading and returns its row id.
    pub async fn insert(&self, reading: &Reading) -> Result<i64> {
        let result =
            sqlx::query("INSERT INTO readings (timestamp, temperature, humidity) VALUES (?, ?, ?)")
                .bind(format_timestamp(&reading.timestamp))
                .bind(reading.temperature)
                .bind(reading.humidity)
                .execute(&self.pool)
                .await
                .map_err(Error::DatastoreWrite)?;

        let id = result.last_insert_rowid();
        debug!("Inserted reading {}", id);
        Ok(id)
    }

    /// Returns readings in insertion order, optionally only those taken at
    /// or after `since`.
    pub async fn readings(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Reading>> {
        let rows: Vec<(String, f64, f64)> = match since {
            Some(since) => {
                sqlx::query_as::<_, (String, f64, f64)>(
                    "SELECT timestamp, temperature, humidity FROM readings \
                     WHERE timestamp >= ? ORDER BY id",
                )
                .bind(format_timestamp(&since))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, (String, f64, f64)>(
                    "SELECT timestamp, temperature, humidity FROM readings ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::DatastoreRead)?;

        rows.into_iter().map(into_reading).collect()
    }

    /// Returns the most recent reading.
    pub async fn latest(&self) -> Result<Option<Reading>> {
        let row: Option<(String, f64, f64)> = sqlx::query_as(
            "SELECT timestamp, temperature, humidity FROM readings ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatastoreRead)?;

        row.map(into_reading).transpose()
    }

    /// Returns the number of stored readings.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM readings")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::DatastoreRead)
    }

    /// Runs a trivial query against the readings table.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1 FROM readings LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::DatastoreRead)?;
        Ok(())
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl ReadingStore for Datastore {
    fn append(&self, reading: &Reading) -> impl Future<Output = Result<()>> + Send {
        async move { self.insert(reading).await.map(|_| ()) }
    }
}

fn into_reading((timestamp, temperature, humidity): (String, f64, f64)) -> Result<Reading> {
    let timestamp = parse_timestamp(&timestamp)
        .map_err(|e| Error::DatastoreRead(sqlx::Error::Decode(Box::new(e))))?;
    Ok(Reading {
        timestamp,
        temperature,
        humidity,
    })
}
