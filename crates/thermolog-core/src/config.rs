//! Configuration management.
//!
//! Settings are `KEY=value` pairs read from a dotenv-style file, with the
//! process environment taking precedence. They are parsed once at startup
//! into a [`Config`] that is passed to each component.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thermolog_hw::SensorKind;

use crate::{Error, Result};

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "thermolog.env";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite database file (`DB_PATH`)
    pub db_path: PathBuf,

    /// Seconds between samples (`SAMPLE_INTERVAL_SECONDS`)
    pub sample_interval_secs: u64,

    /// Sensor hardware variant (`SENSOR_TYPE`)
    pub sensor: SensorKind,

    /// Linux I2C device the sensor is attached to (`I2C_BUS`)
    pub i2c_bus: String,

    /// Listen address for both HTTP servers (`BIND_ADDRESS`)
    pub bind_address: IpAddr,

    /// Dashboard port (`WEB_PORT`)
    pub web_port: u16,

    /// Probe health endpoint port (`HEALTH_PORT`)
    pub health_port: u16,

    /// File the sampler also appends its log to (`LOG_FILE`)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("thermolog.db"),
            sample_interval_secs: 60,
            sensor: SensorKind::default(),
            i2c_bus: thermolog_hw::DEFAULT_I2C_BUS.to_string(),
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            web_port: 5000,
            health_port: 8080,
            log_file: None,
        }
    }
}

impl Config {
    /// Loads configuration from a dotenv-style file overlaid with the
    /// process environment.
    ///
    /// A missing file is an error only when `required` is set, which is
    /// the case when the path was given explicitly.
    pub fn load<P: AsRef<Path>>(path: P, required: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut file_values = HashMap::new();

        if path.exists() {
            let entries = dotenvy::from_path_iter(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            for entry in entries {
                let (key, value) = entry.map_err(|e| {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), e))
                })?;
                file_values.insert(key, value);
            }
        } else if required {
            return Err(Error::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_values.get(key).cloned())
        })
    }

    /// Builds a configuration from a key lookup, using defaults for
    /// absent keys and rejecting malformed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let sample_interval_secs =
            parse_or(&get, "SAMPLE_INTERVAL_SECONDS", defaults.sample_interval_secs)?;
        if sample_interval_secs == 0 {
            return Err(Error::Config(
                "SAMPLE_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }

        let sensor = match get("SENSOR_TYPE") {
            Some(name) => name
                .parse()
                .map_err(|e: thermolog_hw::Error| Error::Config(e.to_string()))?,
            None => defaults.sensor,
        };

        Ok(Self {
            db_path: get("DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            sample_interval_secs,
            sensor,
            i2c_bus: get("I2C_BUS").unwrap_or(defaults.i2c_bus),
            bind_address: parse_or(&get, "BIND_ADDRESS", defaults.bind_address)?,
            web_port: parse_or(&get, "WEB_PORT", defaults.web_port)?,
            health_port: parse_or(&get, "HEALTH_PORT", defaults.health_port)?,
            log_file: get("LOG_FILE").map(PathBuf::from),
        })
    }

    /// Returns the sampling interval.
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    /// Returns the dashboard listen address.
    pub fn web_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.web_port)
    }

    /// Returns the probe health listen address.
    pub fn health_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.health_port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={:?}: {}", key, value, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sample_interval(), Duration::from_secs(60));
        assert_eq!(config.web_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.health_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_all_keys() {
        let config = Config::from_lookup(lookup(&[
            ("DB_PATH", "/var/lib/thermolog/readings.db"),
            ("SAMPLE_INTERVAL_SECONDS", "5"),
            ("SENSOR_TYPE", "aht20"),
            ("I2C_BUS", "/dev/i2c-3"),
            ("BIND_ADDRESS", "127.0.0.1"),
            ("WEB_PORT", "8000"),
            ("HEALTH_PORT", "8001"),
            ("LOG_FILE", "/var/log/thermolog/thermolog.log"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/thermolog/readings.db"));
        assert_eq!(config.sample_interval_secs, 5);
        assert_eq!(config.sensor, SensorKind::Aht20);
        assert_eq!(config.i2c_bus, "/dev/i2c-3");
        assert_eq!(config.web_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.health_addr().to_string(), "127.0.0.1:8001");
        assert_eq!(
            config.log_file,
            Some(PathBuf::from("/var/log/thermolog/thermolog.log"))
        );
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config =
            Config::from_lookup(lookup(&[("WEB_PORT", "  "), ("LOG_FILE", "")])).unwrap();
        assert_eq!(config.web_port, 5000);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = Config::from_lookup(lookup(&[("SAMPLE_INTERVAL_SECONDS", "0")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_values() {
        for pair in [
            ("SAMPLE_INTERVAL_SECONDS", "-5"),
            ("SAMPLE_INTERVAL_SECONDS", "soon"),
            ("WEB_PORT", "70000"),
            ("SENSOR_TYPE", "dht22"),
            ("BIND_ADDRESS", "localhost"),
        ] {
            let result = Config::from_lookup(lookup(&[pair]));
            assert!(matches!(result, Err(Error::Config(_))), "{:?}", pair);
        }
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermolog.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# probe settings").unwrap();
        writeln!(file, "THERMOLOG_TEST_UNUSED=1").unwrap();
        writeln!(file, "SENSOR_TYPE=fake").unwrap();

        let config = Config::load(&path, true).unwrap();
        assert_eq!(config.sensor, SensorKind::Fake);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.env");

        assert!(matches!(Config::load(&path, true), Err(Error::Config(_))));
        assert!(Config::load(&path, false).is_ok());
    }
}
