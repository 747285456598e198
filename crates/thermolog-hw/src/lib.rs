//! thermolog sensor library
//!
//! Drivers for the I2C temperature/humidity sensors supported by the probe
//! (Si7021 and AHT20), written against `embedded-hal` 1.0 so they run on any
//! bus implementation. [`open`] wires a driver to a Linux `/dev/i2c-*` device.

pub mod aht20;
pub mod error;
pub mod fake;
mod linux;
pub mod sensor;
pub mod si7021;

pub use aht20::Aht20;
pub use error::{Error, Result};
pub use fake::FakeSensor;
pub use linux::open;
pub use sensor::{Sample, Sensor, SensorKind};
pub use si7021::Si7021;

/// Default Linux I2C bus on a Raspberry Pi.
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";

/// CRC-8 with polynomial 0x31 as used by both supported sensors.
///
/// The Si7021 seeds with 0x00, the AHT20 with 0xFF.
pub(crate) fn crc8(init: u8, data: &[u8]) -> u8 {
    let mut crc = init;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory I2C bus for driver tests.

    use embedded_hal::delay::DelayNs;
    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};
    use std::collections::VecDeque;

    /// Records writes and answers reads from a queue of canned responses.
    #[derive(Default)]
    pub struct FakeBus {
        pub writes: Vec<(u8, Vec<u8>)>,
        pub responses: VecDeque<Vec<u8>>,
        pub fail: bool,
    }

    impl FakeBus {
        pub fn with_responses(responses: Vec<Vec<u8>>) -> Self {
            Self {
                responses: responses.into(),
                ..Default::default()
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c<SevenBitAddress> for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        let response = self.responses.pop_front().ok_or(ErrorKind::Other)?;
                        buf.copy_from_slice(&response[..buf.len()]);
                    }
                }
            }
            Ok(())
        }
    }

    pub struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }
}
