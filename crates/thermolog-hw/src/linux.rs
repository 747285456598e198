//! Opening sensors on Linux I2C character devices.

use linux_embedded_hal::{Delay, I2cdev};
use tracing::info;

use crate::{Aht20, Error, FakeSensor, Result, Sensor, SensorKind, Si7021};

/// Opens and initializes a sensor of the given kind on an I2C bus.
///
/// Fails if the bus cannot be opened or the sensor does not answer its
/// initialization sequence.
pub fn open(kind: SensorKind, bus: &str) -> Result<Box<dyn Sensor>> {
    let sensor: Box<dyn Sensor> = match kind {
        SensorKind::Fake => Box::new(FakeSensor::new()),
        SensorKind::Si7021 => {
            let mut sensor = Si7021::new(open_bus(bus)?, Delay);
            sensor.reset()?;
            Box::new(sensor)
        }
        SensorKind::Aht20 => {
            let mut sensor = Aht20::new(open_bus(bus)?, Delay);
            sensor.reset()?;
            sensor.init()?;
            Box::new(sensor)
        }
    };
    info!("Opened {} sensor", sensor.name());
    Ok(sensor)
}

fn open_bus(path: &str) -> Result<I2cdev> {
    I2cdev::new(path).map_err(|e| Error::Open {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
