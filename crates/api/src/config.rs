//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `STUDENT_API_*` environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rate_limit::RateLimitConfig;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "STUDENT_API_CONFIG";

/// Config file read when `STUDENT_API_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "student-api.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid rate limit: {0}")]
    RateLimit(String),

    #[error("Invalid log level: {0}")]
    LogLevel(String),
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Start with the three sample students
    pub seed_sample_data: bool,
    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    pub rate_limit: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            seed_sample_data: true,
            log_level: "info".to_string(),
            log_json: false,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (optional, may be missing) and the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("STUDENT_API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
