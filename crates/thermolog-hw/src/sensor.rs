//! Sensor trait and supported hardware variants.

use crate::{Error, Result};
use std::str::FromStr;

/// One temperature/humidity measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent (0-100).
    pub humidity: f64,
}

/// Trait for all temperature/humidity sensors.
pub trait Sensor: Send {
    /// Returns the sensor name.
    fn name(&self) -> &str;

    /// Takes one measurement.
    fn read(&mut self) -> Result<Sample>;
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&mut self) -> Result<Sample> {
        (**self).read()
    }
}

/// Supported sensor variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorKind {
    /// Silicon Labs Si7021.
    #[default]
    Si7021,
    /// Aosong AHT20.
    Aht20,
    /// Random readings, for running without hardware.
    Fake,
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "si7021" => Ok(SensorKind::Si7021),
            "aht20" | "ahtx0" => Ok(SensorKind::Aht20),
            "fake" => Ok(SensorKind::Fake),
            _ => Err(Error::UnknownSensor(s.to_string())),
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Si7021 => write!(f, "si7021"),
            SensorKind::Aht20 => write!(f, "aht20"),
            SensorKind::Fake => write!(f, "fake"),
        }
    }
}
