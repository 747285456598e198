//! Si7021 humidity and temperature sensor.
//!
//! Uses no-hold-master mode: trigger a humidity conversion, wait, then read
//! the result. The temperature taken during that conversion is fetched with
//! a separate command and carries no checksum.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use tracing::debug;

use crate::{crc8, Error, Result, Sample, Sensor};

/// Fixed I2C address.
pub const SI7021_ADDRESS: u8 = 0x40;

const CMD_MEASURE_RH_NO_HOLD: u8 = 0xF5;
const CMD_READ_TEMP_FROM_RH: u8 = 0xE0;
const CMD_RESET: u8 = 0xFE;

/// Worst-case RH plus temperature conversion time is 22.8 ms.
const CONVERSION_MS: u32 = 25;
const RESET_MS: u32 = 15;

/// Si7021 driver.
pub struct Si7021<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Si7021<I2C, D> {
    /// Creates a driver on the given bus.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Issues a soft reset and waits for the sensor to come back.
    pub fn reset(&mut self) -> Result<()> {
        self.i2c
            .write(SI7021_ADDRESS, &[CMD_RESET])
            .map_err(Error::bus)?;
        self.delay.delay_ms(RESET_MS);
        debug!("Si7021 reset");
        Ok(())
    }

    /// Measures humidity and the temperature taken alongside it.
    pub fn measure(&mut self) -> Result<Sample> {
        self.i2c
            .write(SI7021_ADDRESS, &[CMD_MEASURE_RH_NO_HOLD])
            .map_err(Error::bus)?;
        self.delay.delay_ms(CONVERSION_MS);

        let mut rh = [0u8; 3];
        self.i2c.read(SI7021_ADDRESS, &mut rh).map_err(Error::bus)?;
        let expected = crc8(0x00, &rh[..2]);
        if expected != rh[2] {
            return Err(Error::Crc {
                expected,
                actual: rh[2],
            });
        }

        let mut temp = [0u8; 2];
        self.i2c
            .write_read(SI7021_ADDRESS, &[CMD_READ_TEMP_FROM_RH], &mut temp)
            .map_err(Error::bus)?;

        Ok(Sample {
            temperature: temperature_from_raw(u16::from_be_bytes(temp)),
            humidity: humidity_from_raw(u16::from_be_bytes([rh[0], rh[1]])),
        })
    }
}

/// Converts a raw humidity code to percent, clamped to 0-100.
pub fn humidity_from_raw(raw: u16) -> f64 {
    (125.0 * f64::from(raw) / 65536.0 - 6.0).clamp(0.0, 100.0)
}

/// Converts a raw temperature code to degrees Celsius.
pub fn temperature_from_raw(raw: u16) -> f64 {
    175.72 * f64::from(raw) / 65536.0 - 46.85
}

impl<I2C, D> Sensor for Si7021<I2C, D>
where
    I2C: I2c + Send,
    D: DelayNs + Send,
{
    fn name(&self) -> &str {
        "si7021"
    }

    fn read(&mut self) -> Result<Sample> {
        self.measure()
    }
}
