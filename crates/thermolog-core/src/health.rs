//! Sampling loop liveness.
//!
//! The loop writes into a [`HealthMonitor`] after every cycle. HTTP handlers
//! read a [`HealthReport`] snapshot from the same monitor and never touch
//! the sensor.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Process-local health state, reset on restart.
#[derive(Debug, Clone, Default)]
pub struct HealthStatus {
    /// When the last reading was stored.
    pub last_success: Option<Instant>,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Readings stored since startup.
    pub total_samples: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

/// Snapshot served by the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// `"ok"` or `"unhealthy"`.
    pub status: &'static str,
    /// Whether a reading was stored within the last two intervals.
    pub healthy: bool,
    /// Age of the last stored reading; `None` before the first one.
    pub seconds_since_success: Option<f64>,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Readings stored since startup.
    pub total_samples: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// Configured sampling interval.
    pub interval_seconds: u64,
}

/// Shared health state of one sampling loop.
#[derive(Debug)]
pub struct HealthMonitor {
    interval: Duration,
    started: Instant,
    status: Mutex<HealthStatus>,
}

impl HealthMonitor {
    /// Creates a monitor for a loop with the given interval.
    ///
    /// Until the first success, the creation time counts as the last
    /// success so a freshly started probe is healthy for two intervals.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Instant::now(),
            status: Mutex::new(HealthStatus::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HealthStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a stored reading.
    pub fn record_success(&self) {
        let mut status = self.lock();
        status.last_success = Some(Instant::now());
        status.consecutive_failures = 0;
        status.total_samples += 1;
    }

    /// Records a failed cycle and returns the consecutive failure count.
    pub fn record_failure(&self, error: &str) -> u32 {
        let mut status = self.lock();
        status.consecutive_failures = status.consecutive_failures.saturating_add(1);
        status.last_error = Some(error.to_string());
        status.consecutive_failures
    }

    /// Returns a copy of the current state.
    pub fn status(&self) -> HealthStatus {
        self.lock().clone()
    }

    /// Builds a report as of now.
    pub fn report(&self) -> HealthReport {
        self.report_at(Instant::now())
    }

    /// Builds a report as of `now`.
    pub fn report_at(&self, now: Instant) -> HealthReport {
        let status = self.status();
        let since = status.last_success.unwrap_or(self.started);
        let elapsed = now.saturating_duration_since(since);
        let healthy = elapsed <= self.interval * 2;

        HealthReport {
            status: if healthy { "ok" } else { "unhealthy" },
            healthy,
            seconds_since_success: status
                .last_success
                .map(|t| now.saturating_duration_since(t).as_secs_f64()),
            consecutive_failures: status.consecutive_failures,
            total_samples: status.total_samples,
            last_error: status.last_error,
            interval_seconds: self.interval.as_secs(),
        }
    }
}
