//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default API root used by the development server proxy
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration source could not be read or deserialized
    #[cfg(not(target_arch = "wasm32"))]
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was present but unusable
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root address every request path is appended to
    pub base_url: String,

    /// Default per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Timeout applied to file-bearing requests in milliseconds
    pub upload_timeout_ms: u64,

    /// User agent sent on native targets
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 7_000,
            upload_timeout_ms: 30_000,
            user_agent: concat!("quill-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at the given API root
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Default request timeout
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Timeout for uploads
    pub const fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    /// Check the values that cannot be expressed in the type
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or a timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.upload_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "upload_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from file, with `QUILL_*` environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("QUILL"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("timeout_ms", defaults.timeout_ms)?
            .set_default("upload_timeout_ms", defaults.upload_timeout_ms)?
            .set_default("user_agent", defaults.user_agent)?
            .add_source(config::Environment::with_prefix("QUILL"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
