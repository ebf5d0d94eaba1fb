//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{SystemClock, DEFAULT_TTL_SECS};
use crate::dashboard::DashboardOptions;
use crate::fetch::{FetcherConfig, RequesterConfig, DEFAULT_MAX_PAGES};
use crate::metrics::MetricKind;
use crate::panel::PatternFormatter;
use crate::range::Period;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token; prefer `VITALBOARD_TOKEN` over writing it to disk
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_force_https_next")]
    pub force_https_next: bool,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_force_https_next() -> bool {
    true
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
            force_https_next: default_force_https_next(),
            max_pages: default_max_pages(),
        }
    }
}

/// Initial dashboard selection and panel set
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub default_user: Option<String>,

    #[serde(default = "default_period")]
    pub default_period: String,

    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,
}

fn default_period() -> String {
    "today".to_string()
}

fn default_metrics() -> Vec<MetricKind> {
    MetricKind::all().to_vec()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_user: None,
            default_period: default_period(),
            metrics: default_metrics(),
        }
    }
}

/// Timestamp display configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// strftime pattern for sample timestamps
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_date_format() -> String {
    "%b %d, %H:%M".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            utc_offset_minutes: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("vitalboard").join("config.toml")),
            Some(PathBuf::from("/etc/vitalboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Backend overrides
        if let Some(url) = lookup("VITALBOARD_BASE_URL") {
            self.backend.base_url = url;
        }
        if let Some(token) = lookup("VITALBOARD_TOKEN") {
            self.backend.token = Some(token);
        }

        // Dashboard overrides
        if let Some(user) = lookup("VITALBOARD_USER") {
            self.dashboard.default_user = Some(user);
        }

        // Logging overrides
        if let Some(level) = lookup("VITALBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("VITALBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn requester_config(&self) -> RequesterConfig {
        RequesterConfig {
            base_url: self.backend.base_url.clone(),
            token: self.backend.token.clone(),
            request_timeout_ms: self.backend.request_timeout_secs.saturating_mul(1000),
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            force_https_next: self.backend.force_https_next,
            max_pages: self.backend.max_pages,
        }
    }

    /// Panel options; the cache window is always the fixed five minutes
    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            cache_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            clock: Arc::new(SystemClock),
            formatter: Arc::new(PatternFormatter::new(
                self.display.date_format.clone(),
                self.display.utc_offset_minutes,
            )),
        }
    }

    /// Configured default period; an unknown value falls back to today
    pub fn default_period(&self) -> Period {
        self.dashboard.default_period.parse().unwrap_or_else(|e| {
            tracing::warn!("{}; using today", e);
            Period::Today
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Vitalboard Configuration
#
# Environment variables override these settings:
# - VITALBOARD_BASE_URL
# - VITALBOARD_TOKEN
# - VITALBOARD_USER
# - VITALBOARD_LOG_LEVEL
# - VITALBOARD_LOG_FORMAT

[backend]
# Health backend base URL
base_url = "http://localhost:8000"

# Bearer token (prefer VITALBOARD_TOKEN)
# token = ""

# Request timeout in seconds
request_timeout_secs = 10

# Follow http:// pagination links over https://
force_https_next = true

# Maximum pages followed in one fetch
max_pages = 1000

[dashboard]
# User whose data is shown; omit for the backend's default user
# default_user = ""

# today, week or month
default_period = "today"

# Panels to show, in order
metrics = [
    "heart_rate",
    "spo2",
    "blood_pressure",
    "sleep",
    "stress",
    "hrv",
    "steps",
    "daily_activity",
]

[display]
# strftime pattern for sample timestamps
date_format = "%b %d, %H:%M"

# Offset from UTC for displayed timestamps (minutes)
utc_offset_minutes = 0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
