use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use weather_core::{Config, Resolved, WeatherCache, WeatherStore, provider_from_config};

const DEFAULT_CITY: &str = "Andijan";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-cache", version, about = "Cached weather lookup")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set endpoint, API key and database path.
    Configure,

    /// Show weather for a city, from the database if it is less than an hour old.
    Show {
        #[arg(default_value = DEFAULT_CITY)]
        city: String,
    },

    /// Print every cached row as JSON.
    Dump,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;

        match self.command {
            Command::Configure => configure(config, self.config)?,
            Command::Show { city } => show(&config, &city).await?,
            Command::Dump => dump(&config)?,
        }

        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => {
                let mut cfg = Config::load_from(path)?;
                cfg.apply_env(|key| std::env::var(key).ok());
                Ok(cfg)
            }
            None => Config::load(),
        }
    }
}

fn configure(mut config: Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    config.endpoint = Text::new("Weather API endpoint:")
        .with_default(&config.endpoint)
        .prompt()?;

    let api_key = Password::new("API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.api_key = Some(api_key.trim().to_string());
    }

    let db_default = config.database_path()?.display().to_string();
    let db_path = Text::new("Database file:").with_default(&db_default).prompt()?;
    config.connection_string = Some(db_path);

    let saved_to = match path {
        Some(path) => {
            config.save_to(&path)?;
            path
        }
        None => config.save()?,
    };

    println!("Configuration saved to {}", saved_to.display());
    Ok(())
}

async fn show(config: &Config, city: &str) -> anyhow::Result<()> {
    let store = WeatherStore::new(config.database_path()?);
    // A fresh row can be served without an API key.
    let cache = match provider_from_config(config) {
        Ok(provider) => WeatherCache::new(store, provider),
        Err(e) => {
            tracing::debug!("Weather provider unavailable: {}", e);
            WeatherCache::cache_only(store, e.to_string())
        }
    };

    match cache.resolve(city, Local::now().naive_local()).await {
        Ok(Resolved::Cached(record)) => {
            let json = serde_json::to_string(&record).context("Failed to serialize record")?;
            println!("Received weather data from database: {json}");
        }
        Ok(Resolved::Fetched(record)) => {
            let json = serde_json::to_string(&record).context("Failed to serialize record")?;
            println!("New weather data stored in database.");
            println!("Received weather data from API: {json}");
        }
        Err(e) => {
            tracing::error!("Weather lookup for {} failed: {}", city, e);
            eprintln!("Failed to get weather data for {city}: {e}");
        }
    }

    Ok(())
}

fn dump(config: &Config) -> anyhow::Result<()> {
    let store = WeatherStore::new(config.database_path()?);

    match store.list_all() {
        Ok(records) => {
            let json =
                serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
            println!("{json}");
        }
        Err(e) => eprintln!("Failed to retrieve weather data: {e}"),
    }

    Ok(())
}
