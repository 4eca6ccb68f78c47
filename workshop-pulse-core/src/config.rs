//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/workshop-pulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/workshop-pulse/` (~/.config/workshop-pulse/)
//! - Data: `$XDG_DATA_HOME/workshop-pulse/` (~/.local/share/workshop-pulse/)
//! - State/Logs: `$XDG_STATE_HOME/workshop-pulse/` (~/.local/state/workshop-pulse/)

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::usage::pricing::{ModelRate, PricingTable};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "workshop-pulse";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External calendar fetch settings
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Capacity and backend of the in-process stores
    #[serde(default)]
    pub store: StoreConfig,

    /// Model pricing overrides
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Google Calendar fetch configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    /// API root, without trailing slash
    #[serde(default = "default_calendar_api_base")]
    pub api_base_url: String,

    /// Calendar to read events from
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Days before now to request; covers both trend windows by default
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Days after now to request
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,

    /// Events per fetch
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Budget for the whole fetch, retries included
    #[serde(default = "default_calendar_timeout")]
    pub timeout_secs: u64,

    /// Retry attempts for transient failures
    #[serde(default = "default_calendar_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_calendar_base_delay")]
    pub base_delay_ms: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_calendar_api_base(),
            calendar_id: default_calendar_id(),
            lookback_days: default_lookback_days(),
            lookahead_days: default_lookahead_days(),
            max_results: default_max_results(),
            timeout_secs: default_calendar_timeout(),
            max_retries: default_calendar_max_retries(),
            base_delay_ms: default_calendar_base_delay(),
        }
    }
}

impl CalendarConfig {
    /// Backoff policy for the calendar fetch
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    /// Overall fetch budget
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_calendar_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_lookback_days() -> i64 {
    60
}

fn default_lookahead_days() -> i64 {
    30
}

fn default_max_results() -> u32 {
    250
}

fn default_calendar_timeout() -> u64 {
    10
}

fn default_calendar_max_retries() -> u32 {
    3
}

fn default_calendar_base_delay() -> u64 {
    1000
}

/// Which [`WorkshopStore`](crate::store::WorkshopStore) backs manual records
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite file; defaults to `$XDG_DATA_HOME/workshop-pulse/workshops.db`
    pub sqlite_path: Option<PathBuf>,

    /// Manual workshop records kept before evicting the oldest
    #[serde(default = "default_workshop_capacity")]
    pub workshop_capacity: usize,

    /// AI usage entries kept before evicting the oldest
    #[serde(default = "default_usage_capacity")]
    pub usage_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: None,
            workshop_capacity: default_workshop_capacity(),
            usage_capacity: default_usage_capacity(),
        }
    }
}

fn default_workshop_capacity() -> usize {
    1000
}

fn default_usage_capacity() -> usize {
    5000
}

/// Pricing overrides, rates in USD per 1000 tokens
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PricingConfig {
    /// Replaces the built-in fallback rate
    pub default: Option<ModelRate>,

    /// Added to (or replacing entries of) the built-in table
    #[serde(default)]
    pub models: HashMap<String, ModelRate>,
}

impl PricingConfig {
    /// Built-in table with these overrides applied
    pub fn table(&self) -> PricingTable {
        let mut table = PricingTable::default();
        for (model, rate) in &self.models {
            table.insert(model, *rate);
        }
        if let Some(rate) = self.default {
            table.set_default_rate(rate);
        }
        table
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the stores and fetcher cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.store.workshop_capacity == 0 {
            return Err(Error::Config(
                "store.workshop_capacity must be at least 1".to_string(),
            ));
        }
        if self.store.usage_capacity == 0 {
            return Err(Error::Config(
                "store.usage_capacity must be at least 1".to_string(),
            ));
        }
        if self.calendar.max_results == 0 {
            return Err(Error::Config(
                "calendar.max_results must be at least 1".to_string(),
            ));
        }
        if self.calendar.lookback_days < 0 || self.calendar.lookahead_days < 0 {
            return Err(Error::Config(
                "calendar lookback/lookahead days must not be negative".to_string(),
            ));
        }
        let rates = self
            .pricing
            .models
            .iter()
            .map(|(model, rate)| (model.as_str(), rate))
            .chain(self.pricing.default.as_ref().map(|rate| ("default", rate)));
        for (model, rate) in rates {
            if !rate.is_valid() {
                return Err(Error::Config(format!(
                    "pricing for {} must be finite and non-negative",
                    model
                )));
            }
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/workshop-pulse/config.toml` (~/.config/workshop-pulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the data directory path (for the optional SQLite store)
    ///
    /// `$XDG_DATA_HOME/workshop-pulse/` (~/.local/share/workshop-pulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join(APP_DIR)
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/workshop-pulse/` (~/.local/state/workshop-pulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Returns the SQLite store path, honoring `store.sqlite_path`
    pub fn sqlite_path(&self) -> PathBuf {
        self.store
            .sqlite_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("workshops.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.workshop_capacity, 1000);
        assert_eq!(config.store.usage_capacity, 5000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.calendar.max_retries, 3);
        assert_eq!(config.calendar.base_delay_ms, 1000);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[calendar]
calendar_id = "team@example.com"
timeout_secs = 5
max_retries = 1

[store]
backend = "sqlite"
workshop_capacity = 50

[pricing.default]
prompt_per_1k = 0.001
completion_per_1k = 0.002

[pricing.models."claude-3-haiku"]
prompt_per_1k = 0.00025
completion_per_1k = 0.00125
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.calendar.calendar_id, "team@example.com");
        assert_eq!(config.calendar.timeout(), Duration::from_secs(5));
        assert_eq!(config.calendar.retry_policy().max_retries, 1);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.workshop_capacity, 50);
        assert_eq!(config.store.usage_capacity, 5000);

        let table = config.pricing.table();
        let cost = table.calculate_cost("claude-3-haiku", 1000, 1000);
        assert!((cost - 0.0015).abs() < 1e-12);
        let fallback = table.calculate_cost("mystery", 1000, 1000);
        assert!((fallback - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let config: Config = toml::from_str("[store]\nusage_capacity = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_price() {
        let toml = r#"
[pricing.models."gpt-4"]
prompt_per_1k = -1.0
completion_per_1k = 0.06
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[calendar]\nmax_results = 10\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.calendar.max_results, 10);

        std::fs::write(&path, "[calendar]\nmax_results = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
