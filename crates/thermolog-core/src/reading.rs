//! The persisted reading entity.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thermolog_hw::Sample;

/// One stored temperature/humidity reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the sample was taken (UTC, microsecond precision).
    pub timestamp: DateTime<Utc>,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl Reading {
    /// Attaches a timestamp to a sensor sample.
    ///
    /// The timestamp is truncated to microseconds, the precision it is
    /// stored with.
    pub fn new(timestamp: DateTime<Utc>, sample: Sample) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            temperature: sample.temperature,
            humidity: sample.humidity,
        }
    }
}

/// Formats a timestamp as fixed-width RFC 3339 text.
///
/// Every value has six fractional digits and a `Z` suffix, so text order
/// matches time order.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}
