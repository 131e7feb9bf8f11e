//! InfluxDB sink
//!
//! Writes batches through the InfluxDB 1.x HTTP API:
//! `POST {url}/write?db={database}&precision=ns` with a line protocol body.

mod error;
pub mod line;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

pub use error::SinkError;

use crate::core::config::InfluxConfig;
use crate::data::traits::PointSink;
use crate::data::types::OutputPoint;

/// Maximum number of response body bytes kept in error messages
const ERROR_BODY_MAX_LEN: usize = 512;

#[derive(Debug)]
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: Url,
    username: Option<String>,
    password: String,
    database: String,
}

impl InfluxSink {
    pub fn new(config: &InfluxConfig) -> Result<Self, SinkError> {
        if config.database.is_empty() {
            return Err(SinkError::Config("database must not be empty".to_string()));
        }

        let base = config.url.trim_end_matches('/');
        let base = if base.contains("://") {
            base.to_string()
        } else {
            // Accept bare host:port like the classic proxy flag did
            format!("http://{}", base)
        };

        let mut write_url = Url::parse(&format!("{}/write", base))
            .map_err(|e| SinkError::Config(format!("invalid InfluxDB URL '{}': {}", base, e)))?;
        write_url
            .query_pairs_mut()
            .append_pair("db", &config.database)
            .append_pair("precision", "ns");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            url = %write_url,
            database = %config.database,
            "InfluxDB sink initialized"
        );

        Ok(Self {
            client,
            write_url,
            username: Some(config.username.clone()).filter(|u| !u.is_empty()),
            password: config.password.clone(),
            database: config.database.clone(),
        })
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

#[async_trait]
impl PointSink for InfluxSink {
    fn name(&self) -> &str {
        "influxdb"
    }

    async fn write(&self, points: &[OutputPoint]) -> Result<(), SinkError> {
        let body = line::encode_batch(points);

        let mut request = self.client.post(self.write_url.clone()).body(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, Some(&self.password));
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_MAX_LEN {
                let mut cut = ERROR_BODY_MAX_LEN;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SinkError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        tracing::trace!(
            database = %self.database,
            points = points.len(),
            "Wrote batch to InfluxDB"
        );
        Ok(())
    }
}
