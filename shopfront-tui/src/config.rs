//! Configuration loading for the Shopfront TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShopConfig {
    /// Base URL including the reverse-proxy prefix, e.g.
    /// `http://localhost:3000/api/v1`.
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Render/flush cadence of the event loop.
    pub tick_ms: u64,
    /// Products per page.
    pub page_size: u32,
    /// Dedupe window applied to page queries.
    pub query_dedupe_ms: u64,
    /// Retention for cache entries with no subscribers.
    pub cache_retention_ms: u64,
    /// Poll cadence of the credential-store watcher.
    pub session_poll_ms: u64,
    pub credentials_path: PathBuf,
    pub persistence_path: PathBuf,
    pub cart_badge: BadgeConfig,
    pub notification_badge: BadgeConfig,
    pub theme: ThemeConfig,
}

/// Polling configuration for one header badge.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BadgeConfig {
    pub poll_ms: u64,
    pub dedupe_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or SHOPFRONT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ShopConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ShopConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.session_poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session_poll_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cart_badge.poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cart_badge.poll_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.notification_badge.poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notification_badge.poll_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.credentials_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "credentials_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.theme.name.to_ascii_lowercase() != "market" {
            return Err(ConfigError::InvalidValue {
                field: "theme.name",
                reason: "only 'market' is supported".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("SHOPFRONT_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
