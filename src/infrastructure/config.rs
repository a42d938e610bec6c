use crate::infrastructure::http_data_source::DEFAULT_TIMEOUT;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const API_KEY_ENV: &str = "INDIANAPI_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub fetch: FetchSettings,
    pub storage: StorageSettings,
    pub indianapi: IndianApiSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    /// Freshness window for views of widgets that do not poll.
    pub default_ttl_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchSettings {
    pub timeout_secs: u64,
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Empty keeps the dashboard in memory for the life of the process.
    pub directory: String,
}

impl StorageSettings {
    pub fn persistent_directory(&self) -> Option<&str> {
        Some(self.directory.trim()).filter(|dir| !dir.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndianApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_address", "0.0.0.0:8080")?
        .set_default("cache.default_ttl_ms", 30_000)?
        .set_default("fetch.timeout_secs", DEFAULT_TIMEOUT.as_secs())?
        .set_default("storage.directory", "data")?
        .set_default("indianapi.base_url", "https://stock.indianapi.in")?)
}

/// Defaults, then `config/finboard.*` if present, then `FINBOARD_*`
/// environment variables (`FINBOARD_SERVER__BIND_ADDRESS=...`).
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = with_defaults()?
        .add_source(File::with_name("config/finboard").required(false))
        .add_source(
            Environment::with_prefix("FINBOARD")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut app_config: AppConfig = settings.try_deserialize()?;
    if app_config.indianapi.api_key.is_none() {
        app_config.indianapi.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
    }
    Ok(app_config)
}
