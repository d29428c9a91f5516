use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Cached data this many minutes old (or older) is re-fetched.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 60;

/// Current conditions for one city, as fetched from the API or read back from the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// Local wall-clock time at which the API response was received.
    pub last_updated: NaiveDateTime,
}

impl WeatherRecord {
    /// Age of the record relative to `now`. Negative if `last_updated` lies in the future.
    pub fn age(&self, now: NaiveDateTime) -> Duration {
        now - self.last_updated
    }
}

/// True iff the record is strictly younger than [`FRESHNESS_WINDOW_MINUTES`].
pub fn is_fresh(record: &WeatherRecord, now: NaiveDateTime) -> bool {
    record.age(now) < Duration::minutes(FRESHNESS_WINDOW_MINUTES)
}
