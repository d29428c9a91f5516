use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{error::FetchError, model::WeatherRecord};

use super::WeatherProvider;

/// Current-weather client for OpenWeatherMap-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    endpoint: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { endpoint: endpoint.into(), api_key: api_key.into(), http })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        let received_at = Local::now().naive_local();

        tracing::debug!("OpenWeather responded {} for {}", status, city);

        if !status.is_success() {
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(WeatherRecord {
            city: city.to_string(),
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            last_updated: received_at,
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
