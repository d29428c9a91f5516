use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain a record from the weather API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Weather API request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather API returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse weather API response: {0}")]
    Parse(String),

    #[error("Weather API is not configured: {0}")]
    NotConfigured(String),
}

/// Failure to read or write the cache table.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored timestamp '{value}' for '{city}' is malformed: {source}")]
    Timestamp {
        city: String,
        value: String,
        source: chrono::ParseError,
    },
}

/// Terminal failure of a cache resolution.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
