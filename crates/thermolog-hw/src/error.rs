//! Error types for the thermolog sensor library.

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a sensor.
#[derive(Error, Debug)]
pub enum Error {
    /// I2C transaction failed.
    #[error("I2C bus error: {0:?}")]
    Bus(ErrorKind),

    /// Checksum byte did not match the payload.
    #[error("CRC mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Crc { expected: u8, actual: u8 },

    /// Measurement did not complete in time.
    #[error("Sensor still busy after measurement")]
    Busy,

    /// Sensor refused to report calibrated status.
    #[error("Sensor not calibrated")]
    NotCalibrated,

    /// I2C bus device could not be opened.
    #[error("Failed to open I2C bus {path}: {reason}")]
    Open { path: String, reason: String },

    /// Unsupported sensor type name.
    #[error("Unknown sensor type: {0}")]
    UnknownSensor(String),
}

impl Error {
    /// Wraps a HAL bus error.
    pub(crate) fn bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        Error::Bus(err.kind())
    }
}
