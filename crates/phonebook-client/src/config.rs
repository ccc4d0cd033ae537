//! Configuration loading from TOML and environment variables.
//!
//! The client reads its configuration from:
//! 1. A TOML config file (optional)
//! 2. Environment variables (override TOML values)
//! 3. Command-line flags (applied by the binary)
//!
//! Environment variable prefix: PHONEBOOK_

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use phonebook_tree::SearchConfig;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Directory data source.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Incremental search tuning.
    #[serde(default)]
    pub search: SearchSettings,
    /// Terminal UI settings.
    #[serde(default)]
    pub tui: TuiConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where directory data comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the web application serving `phonebook/get_data`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// JSON fixture to serve from memory instead of HTTP.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Quiet period after the last keystroke, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Minimum query length in characters.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Redraw interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "phonebook_tree=debug").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file. The terminal UI owns stdout, so without a file its logs
    /// are discarded.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// -- Defaults --

fn default_base_url() -> String {
    "http://127.0.0.1:5000/".to_string()
}
fn default_request_timeout() -> u64 {
    phonebook_protocol::DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_debounce_ms() -> u64 {
    phonebook_protocol::DEBOUNCE_MS
}
fn default_min_query_len() -> usize {
    phonebook_protocol::MIN_QUERY_LEN
}
fn default_tick_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}

// -- Trait impls --

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            fixture: None,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_len: default_min_query_len(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, with environment variable overrides.
    ///
    /// A missing file falls back to defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let mut config = if let Some(path) = path {
            if path.exists() {
                Self::from_file(path)?
            } else {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not found, using defaults"
                );
                Self::default()
            }
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Apply `PHONEBOOK_*` overrides looked up through `lookup`.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PHONEBOOK_BASE_URL") {
            self.service.base_url = val;
        }
        if let Some(val) = lookup("PHONEBOOK_REQUEST_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.service.request_timeout_secs = secs;
            }
        }
        if let Some(val) = lookup("PHONEBOOK_FIXTURE") {
            self.service.fixture = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("PHONEBOOK_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse() {
                self.search.debounce_ms = ms;
            }
        }
        if let Some(val) = lookup("PHONEBOOK_MIN_QUERY_LEN") {
            if let Ok(n) = val.parse() {
                self.search.min_query_len = n;
            }
        }
        if let Some(val) = lookup("PHONEBOOK_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("PHONEBOOK_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(val));
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            min_query_len: self.search.min_query_len,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tui.tick_ms)
    }
}
