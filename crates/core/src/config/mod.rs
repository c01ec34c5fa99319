//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, in order of increasing
//! precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if REGCOUNT_CONFIG_FILE set)
//! 3. Environment variables (REGCOUNT_*)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheOptions, FlushPolicy};

mod validation;

pub use validation::ConfigError;

/// How the cache decides when to write itself to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    Writes,
    Interval,
    Shutdown,
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the upstream regulation API.
    ///
    /// Set via REGCOUNT_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via REGCOUNT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via REGCOUNT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Pause between consecutive titles of one organization, in milliseconds.
    ///
    /// Set via REGCOUNT_REQUEST_DELAY_MS environment variable.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Path to the JSON cache file.
    ///
    /// Set via REGCOUNT_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Entry lifetime in seconds.
    ///
    /// Set via REGCOUNT_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Set via REGCOUNT_FLUSH_MODE (`writes`, `interval` or `shutdown`).
    #[serde(default = "default_flush_mode")]
    pub flush_mode: FlushMode,

    /// Writes between flushes when `flush_mode = "writes"`.
    #[serde(default = "default_flush_every_writes")]
    pub flush_every_writes: usize,

    /// Seconds between flushes when `flush_mode = "interval"`.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// JSON file listing organizations and their references.
    ///
    /// Set via REGCOUNT_DIRECTORY_PATH environment variable.
    #[serde(default = "default_directory_path")]
    pub directory_path: PathBuf,
}

fn default_base_url() -> String {
    "https://www.ecfr.gov".into()
}

fn default_user_agent() -> String {
    "regcount/0.1".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_request_delay_ms() -> u64 {
    1_000
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./cache/regcount-cache.json")
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_flush_mode() -> FlushMode {
    FlushMode::Writes
}

fn default_flush_every_writes() -> usize {
    10
}

fn default_flush_interval_secs() -> u64 {
    300
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("./data/agencies.json")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            request_delay_ms: default_request_delay_ms(),
            cache_path: default_cache_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            flush_mode: default_flush_mode(),
            flush_every_writes: default_flush_every_writes(),
            flush_interval_secs: default_flush_interval_secs(),
            directory_path: default_directory_path(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        match self.flush_mode {
            FlushMode::Writes => FlushPolicy::EveryNWrites(self.flush_every_writes),
            FlushMode::Interval => FlushPolicy::Interval(Duration::from_secs(self.flush_interval_secs)),
            FlushMode::Shutdown => FlushPolicy::OnShutdown,
        }
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions { ttl: self.cache_ttl(), flush_policy: self.flush_policy() }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("REGCOUNT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("REGCOUNT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
