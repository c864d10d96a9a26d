use chrono::NaiveDateTime;
use domain::{EmoteMapping, TimeWindow};
use log_service::{DEFAULT_LOG_ARCHIVE_URL, MalformedLinePolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "CHAT_ANALYZER_CONFIG";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_LOG_ARCHIVE_URL: &str = "LOG_ARCHIVE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "config/analyzer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub log_archive: LogArchiveConfig,
    pub demo: DemoConfig,
    /// category -> trigger keywords
    #[serde(default)]
    pub emotes: EmoteMapping,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogArchiveConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub malformed_lines: MalformedLinePolicy,
}

impl Default for LogArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOG_ARCHIVE_URL.to_string(),
            timeout_secs: log_service::DEFAULT_TIMEOUT.as_secs(),
            malformed_lines: MalformedLinePolicy::default(),
        }
    }
}

impl LogArchiveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Channel and window served by the demonstration endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    pub channel: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DemoConfig {
    pub fn window(&self) -> Result<TimeWindow, ConfigError> {
        TimeWindow::new(self.start, self.end).map_err(|e| ConfigError::InvalidValue {
            field: "demo".to_string(),
            reason: e.to_string(),
        })
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl AppConfig {
    /// Load from `CHAT_ANALYZER_CONFIG` (or the default path), then apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;

        if let Ok(bind_addr) = std::env::var(ENV_BIND_ADDR) {
            config.bind_addr = bind_addr;
        }
        if let Ok(base_url) = std::env::var(ENV_LOG_ARCHIVE_URL) {
            config.log_archive.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_archive.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_archive.base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !log_service::is_valid_channel(self.demo.channel.trim()) {
            return Err(ConfigError::InvalidValue {
                field: "demo.channel".to_string(),
                reason: "must be letters, digits or underscores".to_string(),
            });
        }
        self.demo.window()?;
        Ok(())
    }
}
