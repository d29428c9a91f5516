//! Cache-or-fetch resolution for a single city.
//!
//! A request ends in one of three states:
//! - served from the table, because the stored row is younger than the freshness window;
//! - fetched from the API and persisted, because no usable row existed;
//! - failed, because the fetch or the write did not succeed.

use chrono::NaiveDateTime;

use crate::{
    error::{CacheError, FetchError, StorageError},
    model::{WeatherRecord, is_fresh},
    provider::WeatherProvider,
    store::WeatherStore,
};

/// Successful outcome of [`WeatherCache::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Fresh row read back from the table; no HTTP call was made.
    Cached(WeatherRecord),
    /// Record fetched from the API and written to the table.
    Fetched(WeatherRecord),
}

impl Resolved {
    pub fn record(&self) -> &WeatherRecord {
        match self {
            Resolved::Cached(r) | Resolved::Fetched(r) => r,
        }
    }

    pub fn into_record(self) -> WeatherRecord {
        match self {
            Resolved::Cached(r) | Resolved::Fetched(r) => r,
        }
    }
}

#[derive(Debug)]
enum Remote {
    Provider(Box<dyn WeatherProvider>),
    /// No provider could be built; holds the reason.
    Unavailable(String),
}

#[derive(Debug)]
pub struct WeatherCache {
    store: WeatherStore,
    remote: Remote,
}

impl WeatherCache {
    pub fn new(store: WeatherStore, provider: Box<dyn WeatherProvider>) -> Self {
        Self { store, remote: Remote::Provider(provider) }
    }

    /// A cache that can only serve fresh rows. Any fetch fails with
    /// [`FetchError::NotConfigured`] carrying `reason`.
    pub fn cache_only(store: WeatherStore, reason: impl Into<String>) -> Self {
        Self { store, remote: Remote::Unavailable(reason.into()) }
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    pub fn lookup(&self, city: &str) -> Result<Option<WeatherRecord>, StorageError> {
        self.store.lookup(city)
    }

    pub async fn fetch_remote(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        match &self.remote {
            Remote::Provider(provider) => provider.fetch(city).await,
            Remote::Unavailable(reason) => Err(FetchError::NotConfigured(reason.clone())),
        }
    }

    pub fn upsert(&self, record: &WeatherRecord) -> Result<(), StorageError> {
        self.store.upsert(record)
    }

    /// Serve `city` from the table if its row is fresh at `now`, otherwise fetch and persist.
    ///
    /// A failed lookup is logged and handled like a missing row.
    pub async fn resolve(&self, city: &str, now: NaiveDateTime) -> Result<Resolved, CacheError> {
        match self.lookup(city) {
            Ok(Some(record)) if is_fresh(&record, now) => {
                tracing::debug!("Cache hit for {} (updated {})", city, record.last_updated);
                return Ok(Resolved::Cached(record));
            }
            Ok(Some(record)) => {
                tracing::debug!("Cached weather for {} is stale (updated {})", city, record.last_updated);
            }
            Ok(None) => tracing::debug!("No cached weather for {}", city),
            Err(e) => tracing::warn!("Cache lookup for {} failed, fetching instead: {}", city, e),
        }

        let record = self.fetch_remote(city).await?;
        self.upsert(&record)?;

        Ok(Resolved::Fetched(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Local};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tempfile::TempDir;

    /// Provider double returning a canned outcome and counting calls.
    #[derive(Debug)]
    struct StubProvider {
        calls: Arc<AtomicUsize>,
        temperature: Option<f64>,
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.temperature {
                Some(t) => Ok(WeatherRecord {
                    city: city.to_string(),
                    temperature_c: t,
                    humidity_pct: 40.0,
                    last_updated: Local::now().naive_local(),
                }),
                None => Err(FetchError::Parse("missing field `temp`".into())),
            }
        }
    }

    fn cache(temperature: Option<f64>) -> (TempDir, WeatherCache, Arc<AtomicUsize>) {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider { calls: Arc::clone(&calls), temperature };
        let cache = WeatherCache::new(
            WeatherStore::new(dir.path().join("weather.db")),
            Box::new(provider),
        );
        (dir, cache, calls)
    }

    fn cached_row(age: Duration, now: NaiveDateTime) -> WeatherRecord {
        WeatherRecord {
            city: "Andijan".into(),
            temperature_c: 19.0,
            humidity_pct: 55.0,
            last_updated: now - age,
        }
    }

    #[tokio::test]
    async fn fresh_row_is_served_without_fetching() {
        let (_dir, cache, calls) = cache(Some(21.5));
        let now = Local::now().naive_local();
        let row = cached_row(Duration::minutes(30), now);
        cache.upsert(&row).unwrap();

        let resolved = cache.resolve("Andijan", now).await.unwrap();

        assert_eq!(resolved, Resolved::Cached(row));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_row_is_fetched_and_stored() {
        let (_dir, cache, calls) = cache(Some(21.5));
        let now = Local::now().naive_local();

        let resolved = cache.resolve("Andijan", now).await.unwrap();

        assert!(matches!(resolved, Resolved::Fetched(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stored = cache.lookup("Andijan").unwrap().expect("row was written");
        assert_eq!(&stored, resolved.record());
        assert_eq!(stored.temperature_c, 21.5);
        assert_eq!(stored.humidity_pct, 40.0);
        assert!(stored.age(Local::now().naive_local()) < Duration::minutes(1));
    }

    #[tokio::test]
    async fn stale_row_is_refetched_and_replaced() {
        let (_dir, cache, calls) = cache(Some(21.5));
        let now = Local::now().naive_local();
        cache.upsert(&cached_row(Duration::minutes(60), now)).unwrap();

        let resolved = cache.resolve("Andijan", now).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.record().temperature_c, 21.5);
        assert_eq!(cache.store().list_all().unwrap().len(), 1);
        assert_eq!(cache.lookup("Andijan").unwrap().unwrap().temperature_c, 21.5);
    }

    #[tokio::test]
    async fn failed_fetch_reports_error_and_writes_nothing() {
        let (_dir, cache, calls) = cache(None);
        let now = Local::now().naive_local();

        let result = cache.resolve("Andijan", now).await;

        assert!(matches!(result, Err(CacheError::Fetch(FetchError::Parse(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.lookup("Andijan").unwrap(), None);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_row() {
        let (_dir, cache, _calls) = cache(None);
        let now = Local::now().naive_local();
        let stale = cached_row(Duration::hours(3), now);
        cache.upsert(&stale).unwrap();

        assert!(cache.resolve("Andijan", now).await.is_err());
        assert_eq!(cache.lookup("Andijan").unwrap(), Some(stale));
    }

    #[tokio::test]
    async fn cache_only_serves_fresh_row() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::cache_only(
            WeatherStore::new(dir.path().join("weather.db")),
            "No API key configured.",
        );
        let now = Local::now().naive_local();
        let row = cached_row(Duration::minutes(10), now);
        cache.upsert(&row).unwrap();

        assert_eq!(cache.resolve("Andijan", now).await.unwrap(), Resolved::Cached(row));
    }

    #[tokio::test]
    async fn cache_only_reports_missing_provider_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::cache_only(
            WeatherStore::new(dir.path().join("weather.db")),
            "No API key configured.",
        );
        let now = Local::now().naive_local();
        cache.upsert(&cached_row(Duration::hours(2), now)).unwrap();

        let result = cache.resolve("Andijan", now).await;

        match result {
            Err(CacheError::Fetch(FetchError::NotConfigured(reason))) => {
                assert!(reason.contains("No API key configured"));
            }
            other => panic!("expected missing provider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_row_falls_back_to_fetch() {
        let (_dir, cache, calls) = cache(Some(21.5));
        let now = Local::now().naive_local();
        cache.upsert(&cached_row(Duration::minutes(5), now)).unwrap();

        let conn = rusqlite::Connection::open(cache.store().path()).unwrap();
        conn.execute("UPDATE weather_data SET last_updated = 'garbage'", []).unwrap();
        drop(conn);

        let resolved = cache.resolve("Andijan", now).await.unwrap();

        assert!(matches!(resolved, Resolved::Fetched(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.lookup("Andijan").is_ok());
    }
}
