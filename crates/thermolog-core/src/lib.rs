//! thermolog core
//!
//! The pieces shared by the probe and the dashboard: configuration, the
//! SQLite readings store, the sampling loop and its health tracking.

pub mod config;
pub mod error;
pub mod health;
pub mod reading;
pub mod sampler;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use health::{HealthMonitor, HealthReport, HealthStatus};
pub use reading::Reading;
pub use sampler::{CycleOutcome, SamplingLoop};
pub use store::{Datastore, ReadingStore};
