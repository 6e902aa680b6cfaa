use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_domain::{IngestEndpoint, WeatherReading};
use std::time::Duration;
use tracing::debug;

/// Path on the backend API that receives weather readings.
const WEATHER_LOGS_PATH: &str = "/weather/logs";

/// HTTP adapter for the downstream ingestion API.
///
/// Holds only an immutable client and URL, so it is freely shareable across
/// calls; retry decisions live in the domain layer.
pub struct IngestClient {
    http: reqwest::Client,
    endpoint_url: String,
}

impl IngestClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build http client")?;
        let endpoint_url = format!("{}{}", base_url.trim_end_matches('/'), WEATHER_LOGS_PATH);
        Ok(Self { http, endpoint_url })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl IngestEndpoint for IngestClient {
    async fn send(&self, reading: &WeatherReading) -> Result<u16> {
        let response = self
            .http
            .post(&self.endpoint_url)
            .json(reading)
            .send()
            .await
            .context("http request failed")?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            // The body usually carries the rejection reason
            if let Ok(body) = response.text().await {
                if !body.is_empty() {
                    debug!(status, body = %body, "ingestion api error response");
                }
            }
        }

        Ok(status)
    }
}
