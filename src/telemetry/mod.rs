//! Periodic telemetry export
//!
//! The exporter polls a fixed table of registers, transforms the raw bytes
//! and hands one [`Point`] per cycle to a [`PointSink`].

mod influx;

pub use self::influx::InfluxSink;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::core::{Error, ExporterConfig, ReadingConfig, Result};
use crate::protocol::{Outcome, RegisterAccess};
use crate::transform::Value;

/// A named set of fields at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub time: DateTime<Utc>,
    pub fields: BTreeMap<String, Value>,
}

impl Point {
    /// InfluxDB line protocol with a millisecond timestamp
    pub fn to_line_protocol(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Int(v) => format!("{}i", v),
                    Value::Float(v) => format!("{:?}", v),
                };
                format!("{}={}", escape_field_key(name), value)
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "{} {} {}",
            escape_measurement(&self.measurement),
            fields,
            self.time.timestamp_millis()
        )
    }
}

fn escape_measurement(name: &str) -> String {
    escape(name, &[',', ' '])
}

fn escape_field_key(key: &str) -> String {
    escape(key, &['\\', ',', '=', ' '])
}

fn escape(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Destination of exported points
#[async_trait]
pub trait PointSink: Send + Sync {
    async fn write(&self, point: &Point) -> Result<()>;
}

/// Polls the configured readings and forwards them to a sink
pub struct Exporter<S: PointSink> {
    registers: Arc<dyn RegisterAccess>,
    sink: S,
    config: ExporterConfig,
}

impl<S: PointSink> Exporter<S> {
    pub fn new(registers: Arc<dyn RegisterAccess>, sink: S, config: ExporterConfig) -> Self {
        Exporter {
            registers,
            sink,
            config,
        }
    }

    /// Runs forever, one cycle per interval
    pub async fn run(&self) -> Result<()> {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let point = match self.poll().await {
                Ok(point) => point,
                Err(e) => {
                    error!(error = %e, "telemetry cycle aborted");
                    continue;
                }
            };

            if point.fields.is_empty() {
                warn!("no readings available, skipping point");
                continue;
            }

            if let Err(e) = self.sink.write(&point).await {
                error!(error = %e, "failed to write point");
            }
        }
    }

    /// Reads every configured register once
    ///
    /// Rejected or faulted readings are left out of the point; a hard
    /// error aborts the whole cycle.
    pub async fn poll(&self) -> Result<Point> {
        let registers = Arc::clone(&self.registers);
        let readings = self.config.readings.clone();

        let fields = tokio::task::spawn_blocking(move || read_all(registers.as_ref(), &readings))
            .await
            .map_err(|e| Error::invalid_state(format!("telemetry task failed: {}", e)))??;

        Ok(Point {
            measurement: self.config.measurement.clone(),
            time: Utc::now(),
            fields,
        })
    }
}

fn read_all(
    registers: &dyn RegisterAccess,
    readings: &[ReadingConfig],
) -> Result<BTreeMap<String, Value>> {
    let mut fields = BTreeMap::new();

    for reading in readings {
        match registers.read_register(reading.address, reading.count)? {
            Outcome::Success(bytes) => match reading.transformation.apply(&bytes) {
                Ok(value) => {
                    debug!(name = %reading.name, %value, "reading");
                    fields.insert(reading.name.clone(), value);
                }
                Err(e) => warn!(name = %reading.name, error = %e, "cannot transform reading"),
            },
            outcome => warn!(
                name = %reading.name,
                address = reading.address,
                outcome = outcome.label(),
                "no data for reading"
            ),
        }
    }

    Ok(fields)
}
