use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::{Error, InfluxConfig, Result};
use super::{Point, PointSink};

/// Delay between failed write attempts
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Writes points to an InfluxDB 1.x `/write` endpoint
pub struct InfluxSink {
    client: reqwest::Client,
    url: String,
    retries: u32,
}

impl InfluxSink {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::sink(format!("Failed to build HTTP client: {}", e)))?;

        Ok(InfluxSink {
            client,
            url: write_url(config),
            retries: config.retries,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn write_once(&self, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::sink(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::sink(format!("InfluxDB answered {}: {}", status, text.trim())));
        }
        Ok(())
    }
}

#[async_trait]
impl PointSink for InfluxSink {
    async fn write(&self, point: &Point) -> Result<()> {
        let body = point.to_line_protocol();
        let mut attempt = 0;

        loop {
            match self.write_once(&body).await {
                Ok(()) => {
                    debug!(fields = point.fields.len(), "point written");
                    return Ok(());
                }
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "InfluxDB write failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn write_url(config: &InfluxConfig) -> String {
    format!(
        "http://{}:{}/write?db={}&precision=ms",
        config.host, config.port, config.database
    )
}
