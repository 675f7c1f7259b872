//! Server configuration
//!
//! Layered with the `config` crate: struct defaults, then an optional TOML
//! file (`TANDEM_CONFIG`, default `tandem.toml`), then `TANDEM__*`
//! environment variables, e.g. `TANDEM__CACHE__BACKEND=redis`.

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;
use tandem_core::CoordinatorConfig;

const DEFAULT_CONFIG_FILE: &str = "tandem.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub log: LogSettings,
    pub cache: CacheSettings,
    pub store: StoreSettings,
    pub coordinator: CoordinatorSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    /// Redis `host:port`
    pub addr: String,
    pub password: Option<String>,
    pub db: i64,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `sqlite://...` or `postgres://...`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    pub write_deadline_ms: u64,
    pub repopulate_on_read: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            log: LogSettings::default(),
            cache: CacheSettings::default(),
            store: StoreSettings::default(),
            coordinator: CoordinatorSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            addr: "localhost:6379".to_string(),
            password: None,
            db: 0,
            ttl_secs: 60,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://tandem.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            write_deadline_ms: 5_000,
            repopulate_on_read: false,
        }
    }
}

/// Config file named by `TANDEM_CONFIG`, or `tandem.toml`
pub fn config_path() -> String {
    std::env::var("TANDEM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
}

impl ServerConfig {
    /// Load from the (optional) TOML file at `path` and the process environment
    pub fn load_from(path: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("TANDEM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.coordinator_config().validate()?;
        if self.store.max_connections == 0 {
            anyhow::bail!("store.max_connections must be at least 1");
        }
        Ok(())
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default()
            .with_cache_ttl(Duration::from_secs(self.cache.ttl_secs))
            .with_write_deadline(Duration::from_millis(self.coordinator.write_deadline_ms))
            .with_repopulate_on_read(self.coordinator.repopulate_on_read)
    }
}
