//! Configuration module for telewire
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TELEWIRE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use telewire::config::TelewireConfig;
//!
//! let config = TelewireConfig::default();
//! assert_eq!(config.connection.probe_interval_seconds, 3);
//!
//! let toml = r#"
//! [connection]
//! url = "https://stats.example.com/admin"
//! "#;
//! let config: TelewireConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.connection.url, "https://stats.example.com/admin");
//! assert_eq!(config.sync.request_log_capacity, 100);
//! ```

pub mod connection;
pub mod error;
pub mod logging;
pub mod rules;
pub mod sync;

pub use connection::ConnectionConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use rules::RulesConfig;
pub use sync::SyncConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::transport::admin_endpoint;

/// Unified client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelewireConfig {
    /// Admin channel endpoint and polling
    pub connection: ConnectionConfig,
    /// Client-held state limits
    pub sync: SyncConfig,
    /// Rule exchanges
    pub rules: RulesConfig,
    pub logging: LoggingConfig,
}

impl TelewireConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (previous values are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TELEWIRE_URL") {
            self.connection.url = url;
        }

        if let Ok(capacity) = std::env::var("TELEWIRE_REQUEST_LOG_CAPACITY") {
            if let Ok(c) = capacity.parse() {
                self.sync.request_log_capacity = c;
            }
        }

        if let Ok(level) = std::env::var("TELEWIRE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TELEWIRE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.url.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "connection.url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }
        if let Err(e) = admin_endpoint(&self.connection.url) {
            return Err(ConfigError::Validation {
                field: "connection.url".to_string(),
                message: e.to_string(),
            });
        }

        if self.connection.probe_interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "connection.probe_interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }
        if self.connection.tail_interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "connection.tail_interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }

        if self.sync.request_log_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "sync.request_log_capacity".to_string(),
                message: "capacity must be non-zero".to_string(),
            });
        }

        if self.rules.response_timeout_seconds == Some(0) {
            return Err(ConfigError::Validation {
                field: "rules.response_timeout_seconds".to_string(),
                message: "timeout must be non-zero when set".to_string(),
            });
        }

        Ok(())
    }

    /// Admin channel endpoint derived from `connection.url`.
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        admin_endpoint(&self.connection.url).map_err(|e| ConfigError::Validation {
            field: "connection.url".to_string(),
            message: e.to_string(),
        })
    }
}
