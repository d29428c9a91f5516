use crate::{Config, WeatherRecord, error::FetchError, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of fresh weather records.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for `city`. `last_updated` is set to the time the
    /// response arrived.
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError>;
}

/// Construct the remote provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let provider = OpenWeatherProvider::new(config.endpoint.as_str(), api_key, config.timeout())?;

    Ok(Box::new(provider))
}
