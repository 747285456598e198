//! AHT20 humidity and temperature sensor.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use tracing::{debug, info};

use crate::{crc8, Error, Result, Sample, Sensor};

/// Fixed I2C address.
pub const AHT20_ADDRESS: u8 = 0x38;

const CMD_INIT: [u8; 3] = [0xBE, 0x08, 0x00];
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];
const CMD_SOFT_RESET: u8 = 0xBA;

const STATUS_BUSY: u8 = 0x80;
const STATUS_CALIBRATED: u8 = 0x08;

const INIT_MS: u32 = 10;
const MEASURE_MS: u32 = 80;
const POLL_MS: u32 = 10;
const MAX_POLLS: usize = 5;

/// 2^20, full scale of the 20-bit readings.
const FULL_SCALE: f64 = 1_048_576.0;

/// AHT20 driver.
pub struct Aht20<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Aht20<I2C, D> {
    /// Creates a driver on the given bus.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Loads calibration if the sensor does not report it yet.
    pub fn init(&mut self) -> Result<()> {
        if self.status()? & STATUS_CALIBRATED != 0 {
            return Ok(());
        }

        info!("AHT20 not calibrated, sending init");
        self.i2c.write(AHT20_ADDRESS, &CMD_INIT).map_err(Error::bus)?;
        self.delay.delay_ms(INIT_MS);

        if self.status()? & STATUS_CALIBRATED == 0 {
            return Err(Error::NotCalibrated);
        }
        Ok(())
    }

    /// Issues a soft reset.
    pub fn reset(&mut self) -> Result<()> {
        self.i2c
            .write(AHT20_ADDRESS, &[CMD_SOFT_RESET])
            .map_err(Error::bus)?;
        self.delay.delay_ms(20);
        debug!("AHT20 reset");
        Ok(())
    }

    fn status(&mut self) -> Result<u8> {
        let mut status = [0u8; 1];
        self.i2c
            .read(AHT20_ADDRESS, &mut status)
            .map_err(Error::bus)?;
        Ok(status[0])
    }

    /// Triggers a measurement and reads it back.
    pub fn measure(&mut self) -> Result<Sample> {
        self.i2c
            .write(AHT20_ADDRESS, &CMD_TRIGGER)
            .map_err(Error::bus)?;
        self.delay.delay_ms(MEASURE_MS);

        let mut frame = [0u8; 7];
        let mut polls = 0;
        loop {
            self.i2c
                .read(AHT20_ADDRESS, &mut frame)
                .map_err(Error::bus)?;
            if frame[0] & STATUS_BUSY == 0 {
                break;
            }
            polls += 1;
            if polls >= MAX_POLLS {
                return Err(Error::Busy);
            }
            self.delay.delay_ms(POLL_MS);
        }

        let expected = crc8(0xFF, &frame[..6]);
        if expected != frame[6] {
            return Err(Error::Crc {
                expected,
                actual: frame[6],
            });
        }

        Ok(decode(&frame))
    }
}

/// Unpacks the two 20-bit readings that share the middle byte.
fn decode(frame: &[u8; 7]) -> Sample {
    let humidity_raw =
        (u32::from(frame[1]) << 12) | (u32::from(frame[2]) << 4) | (u32::from(frame[3]) >> 4);
    let temperature_raw =
        ((u32::from(frame[3]) & 0x0F) << 16) | (u32::from(frame[4]) << 8) | u32::from(frame[5]);

    Sample {
        temperature: f64::from(temperature_raw) * 200.0 / FULL_SCALE - 50.0,
        humidity: (f64::from(humidity_raw) * 100.0 / FULL_SCALE).clamp(0.0, 100.0),
    }
}

impl<I2C, D> Sensor for Aht20<I2C, D>
where
    I2C: I2c + Send,
    D: DelayNs + Send,
{
    fn name(&self) -> &str {
        "aht20"
    }

    fn read(&mut self) -> Result<Sample> {
        self.measure()
    }
}
