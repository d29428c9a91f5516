//! Core library for the `weather-cache` CLI.
//!
//! This crate defines:
//! - Configuration (endpoint, API key, database path)
//! - The remote weather provider
//! - The SQLite-backed cache table
//! - Cache-or-fetch resolution with a one-hour freshness window
//!
//! It is used by `weather-cache-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use cache::{Resolved, WeatherCache};
pub use config::Config;
pub use error::{CacheError, FetchError, StorageError};
pub use model::{FRESHNESS_WINDOW_MINUTES, WeatherRecord, is_fresh};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::WeatherStore;
