//! Periodic sample-and-store loop.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use thermolog_hw::{Sample, Sensor};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::health::HealthMonitor;
use crate::reading::Reading;
use crate::store::ReadingStore;
use crate::Error;

/// Result of one sampling cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A reading was read and stored.
    Stored(Reading),
    /// The sensor failed; nothing was stored.
    SensorFailed,
    /// The sensor answered but the write failed; the sample was dropped.
    WriteFailed,
}

/// Reads the sensor every interval and appends each sample to the store.
///
/// Failures are logged and counted in the [`HealthMonitor`] but never stop
/// the loop. Sensor reads block on I2C and run on tokio's blocking pool.
pub struct SamplingLoop<S, W> {
    sensor: Arc<Mutex<S>>,
    store: W,
    interval: Duration,
    health: Arc<HealthMonitor>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<S: Sensor + 'static, W: ReadingStore> SamplingLoop<S, W> {
    /// Creates a loop reporting into `health`.
    pub fn new(sensor: S, store: W, interval: Duration, health: Arc<HealthMonitor>) -> Self {
        Self {
            sensor: Arc::new(Mutex::new(sensor)),
            store,
            interval,
            health,
            last_timestamp: None,
        }
    }

    /// Continues the timestamp sequence after `last`, the newest reading
    /// already in the store.
    pub fn with_last_timestamp(mut self, last: Option<DateTime<Utc>>) -> Self {
        self.last_timestamp = last;
        self
    }

    /// Returns the shared health monitor.
    pub fn health(&self) -> Arc<HealthMonitor> {
        self.health.clone()
    }

    /// Sleeps one interval, samples, and repeats forever.
    pub async fn run(mut self) {
        let name = lock(&*self.sensor).name().to_string();
        info!("Sampling {} every {:?}", name, self.interval);

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.cycle().await;
        }
    }

    /// Runs a single read-and-store cycle.
    pub async fn cycle(&mut self) -> CycleOutcome {
        let sample = match self.read_sensor().await {
            Ok(sample) => sample,
            Err(error) => {
                let failures = self.health.record_failure(&error.to_string());
                warn!("{} ({} consecutive failures)", error, failures);
                return CycleOutcome::SensorFailed;
            }
        };

        let timestamp = next_timestamp(Utc::now(), self.last_timestamp);
        let reading = Reading::new(timestamp, sample);

        if let Err(e) = self.store.append(&reading).await {
            let failures = self.health.record_failure(&e.to_string());
            warn!("{} ({} consecutive failures)", e, failures);
            return CycleOutcome::WriteFailed;
        }

        self.last_timestamp = Some(reading.timestamp);
        self.health.record_success();
        info!(
            "Temp: {:.2} C, Humidity: {:.2}%",
            reading.temperature, reading.humidity
        );
        CycleOutcome::Stored(reading)
    }

    async fn read_sensor(&self) -> crate::Result<Sample> {
        let sensor = self.sensor.clone();
        let sample = tokio::task::spawn_blocking(move || lock(&*sensor).read()).await??;
        Ok(sample)
    }
}

fn lock<S>(sensor: &Mutex<S>) -> std::sync::MutexGuard<'_, S> {
    sensor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns `now` at storage precision, or one microsecond past `last` if
/// the clock has not moved beyond it.
fn next_timestamp(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    match last {
        Some(last) if now <= last => last + chrono::Duration::microseconds(1),
        _ => now,
    }
}
