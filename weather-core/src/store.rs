//! SQLite table holding the last fetched record per city.

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};

use crate::{error::StorageError, model::WeatherRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_data (
        city TEXT PRIMARY KEY,
        temperature REAL NOT NULL,
        humidity REAL NOT NULL,
        last_updated TEXT NOT NULL
    );
"#;

/// Handle to the cache table. Every operation opens its own connection and
/// closes it before returning.
#[derive(Debug, Clone)]
pub struct WeatherStore {
    path: PathBuf,
}

impl WeatherStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::debug!("Could not create {}: {}", parent.display(), e);
            }
        }

        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// Point lookup by city. `Ok(None)` when no row exists.
    pub fn lookup(&self, city: &str) -> Result<Option<WeatherRecord>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT city, temperature, humidity, last_updated FROM weather_data WHERE city = ?1",
        )?;

        let mut rows = stmt.query(params![city])?;
        let record = match rows.next()? {
            Some(row) => Some(row_to_record(row)?),
            None => None,
        };
        Ok(record)
    }

    /// Insert the record, or replace temperature, humidity and timestamp of the existing row.
    pub fn upsert(&self, record: &WeatherRecord) -> Result<(), StorageError> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO weather_data (city, temperature, humidity, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (city) DO UPDATE SET
                temperature = excluded.temperature,
                humidity = excluded.humidity,
                last_updated = excluded.last_updated
            "#,
            params![
                record.city,
                record.temperature_c,
                record.humidity_pct,
                record.last_updated.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;

        tracing::info!("Stored weather for {}", record.city);
        Ok(())
    }

    /// Every cached row, ordered by city. Rows with an unreadable timestamp are
    /// logged and skipped.
    pub fn list_all(&self) -> Result<Vec<WeatherRecord>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT city, temperature, humidity, last_updated FROM weather_data ORDER BY city",
        )?;

        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            match row_to_record(row) {
                Ok(record) => records.push(record),
                Err(e @ StorageError::Timestamp { .. }) => {
                    tracing::warn!("Skipping cached row: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }
}

fn row_to_record(row: &Row<'_>) -> Result<WeatherRecord, StorageError> {
    let city: String = row.get(0)?;
    let raw: String = row.get(3)?;

    let last_updated = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|source| {
        StorageError::Timestamp { city: city.clone(), value: raw.clone(), source }
    })?;

    Ok(WeatherRecord {
        temperature_c: row.get(1)?,
        humidity_pct: row.get(2)?,
        city,
        last_updated,
    })
}
