use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Deserialize};

use super::{Error, Result, MAX_REGISTER_SIZE};
use crate::transform::Transformation;

/// Serial adapter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub port: String,
    /// Line speed
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Per-read timeout
    #[serde(default = "default_serial_timeout")]
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub timeout: Duration,
}

/// InfluxDB connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Request timeout
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub timeout: Duration,
    /// Additional attempts after a failed write
    pub retries: u32,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        InfluxConfig {
            host: "localhost".to_string(),
            port: 8086,
            database: "vitolink".to_string(),
            timeout: Duration::from_secs(60),
            retries: 20,
        }
    }
}

/// One register polled by the exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingConfig {
    /// Field name in the exported point
    pub name: String,
    pub transformation: Transformation,
    pub address: u16,
    pub count: u8,
}

impl ReadingConfig {
    pub fn new(name: &str, transformation: Transformation, address: u16, count: u8) -> Self {
        ReadingConfig {
            name: name.to_string(),
            transformation,
            address,
            count,
        }
    }

    /// Checks the register size against the transformation width
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 || self.count as usize > MAX_REGISTER_SIZE {
            return Err(Error::config(format!(
                "reading {}: count {} outside 1..={}",
                self.name, self.count, MAX_REGISTER_SIZE
            )));
        }
        if self.count as usize != self.transformation.width() {
            return Err(Error::config(format!(
                "reading {}: {:?} needs {} bytes, count is {}",
                self.name,
                self.transformation,
                self.transformation.width(),
                self.count
            )));
        }
        Ok(())
    }
}

/// Exporter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Polling interval
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub interval: Duration,
    /// Measurement name of the exported points
    pub measurement: String,
    pub readings: Vec<ReadingConfig>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        ExporterConfig {
            interval: Duration::from_secs(5),
            measurement: "vitolink".to_string(),
            readings: default_readings(),
        }
    }
}

/// HTTP endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Configuration for a vitolink process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub serial: SerialConfig,
    #[serde(default)]
    pub influxdb: InfluxConfig,
    #[serde(default)]
    pub exporter: ExporterConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Parses and validates a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(Error::config("serial.port must not be empty"));
        }
        if self.exporter.interval.is_zero() {
            return Err(Error::config("exporter.interval must be positive"));
        }
        for reading in &self.exporter.readings {
            reading.validate()?;
        }
        Ok(())
    }
}

fn default_baud_rate() -> u32 {
    super::DEFAULT_BAUD_RATE
}

fn default_serial_timeout() -> Duration {
    super::DEFAULT_READ_TIMEOUT
}

/// Boiler, outdoor and return temperatures, boiler set point and burner power
pub fn default_readings() -> Vec<ReadingConfig> {
    vec![
        ReadingConfig::new("KTS", Transformation::Temperature, 0x0802, 2),
        ReadingConfig::new("ATS", Transformation::Temperature, 0x0800, 2),
        ReadingConfig::new("RL17A", Transformation::Temperature, 0x080A, 2),
        ReadingConfig::new("KTS_soll", Transformation::Temperature, 0x555A, 2),
        ReadingConfig::new("Pact", Transformation::Percentage, 0xA38F, 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("[serial]\nport = \"/dev/ttyUSB0\"\n").unwrap();
        assert_eq!(config.serial.baud_rate, 4800);
        assert_eq!(config.serial.timeout, Duration::from_secs(5));
        assert_eq!(config.influxdb.port, 8086);
        assert_eq!(config.exporter.interval, Duration::from_secs(5));
        assert_eq!(config.exporter.readings.len(), 5);
        assert_eq!(config.http.bind.port(), 8080);
    }

    #[test]
    fn test_custom_readings() {
        let text = r#"
            [serial]
            port = "/dev/ttyAMA0"
            timeout = 2

            [influxdb]
            host = "influx.local"
            database = "heating"

            [exporter]
            interval = 10
            readings = [
                { name = "Party", transformation = "uint8", address = 0x3303, count = 1 },
            ]
        "#;
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.serial.timeout, Duration::from_secs(2));
        assert_eq!(config.influxdb.host, "influx.local");
        assert_eq!(config.influxdb.retries, 20);
        assert_eq!(
            config.exporter.readings,
            vec![ReadingConfig::new("Party", Transformation::Uint8, 0x3303, 1)]
        );
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let text = r#"
            [serial]
            port = "/dev/ttyUSB0"

            [exporter]
            readings = [{ name = "KTS", transformation = "temperature", address = 0x0802, count = 1 }]
        "#;
        assert!(matches!(Config::from_toml(text), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_port_rejected() {
        assert!(matches!(Config::from_toml("[http]\nbind = \"127.0.0.1:9000\"\n"), Err(Error::Config(_))));
    }
}
