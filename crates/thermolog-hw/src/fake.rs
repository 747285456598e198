//! Sensor that produces random plausible readings.

use rand::Rng;

use crate::{Result, Sample, Sensor};

/// Random readings in the range of a heated room, for running without hardware.
#[derive(Debug, Default)]
pub struct FakeSensor;

impl FakeSensor {
    /// Creates a new fake sensor.
    pub fn new() -> Self {
        Self
    }
}

impl Sensor for FakeSensor {
    fn name(&self) -> &str {
        "fake"
    }

    fn read(&mut self) -> Result<Sample> {
        let mut rng = rand::rng();
        Ok(Sample {
            temperature: rng.random_range(20.0..30.0),
            humidity: rng.random_range(30.0..60.0),
        })
    }
}
