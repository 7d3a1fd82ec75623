//! Configuration management for Ratekeeper.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{RatekeeperError, Result};
use crate::ratelimit::{Algorithm, FailurePolicy, LimitConfig, DEFAULT_LIMIT, DEFAULT_WINDOW};

/// Prefix of environment variables overriding file settings,
/// e.g. `RATEKEEPER__RATE_LIMITING__LIMIT=20`.
pub const ENV_PREFIX: &str = "RATEKEEPER";

/// Main configuration for the Ratekeeper service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Leak worker configuration
    #[serde(default)]
    pub leak_worker: LeakWorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Static rate limiting defaults. A dynamic override in the store takes
/// precedence over `limit` and `window_secs` at check time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Requests admitted per window
    #[serde(default = "default_limit")]
    pub limit: u64,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Algorithm used when the caller does not name one
    #[serde(default)]
    pub default_algorithm: Algorithm,

    /// Decision when the store fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
            default_algorithm: Algorithm::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl RateLimitingConfig {
    /// The validated static limits.
    pub fn limits(&self) -> Result<LimitConfig> {
        LimitConfig::from_secs(self.limit, self.window_secs)
    }
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW.as_secs()
}

/// Leak worker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakWorkerConfig {
    /// Run the worker alongside the engine
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pause after a failed cycle, in milliseconds
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

impl Default for LeakWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            error_backoff_ms: default_error_backoff_ms(),
        }
    }
}

impl LeakWorkerConfig {
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_error_backoff_ms() -> u64 {
    1000
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Load configuration from a file path, applying `RATEKEEPER__`
    /// environment overrides on top. The format follows the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| RatekeeperError::Config(e.to_string()))?;

        let config: ServiceConfig = settings
            .try_deserialize()
            .map_err(|e| RatekeeperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ServiceConfig =
            serde_yaml::from_str(yaml).map_err(|e| RatekeeperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.rate_limiting.limits()?;
        if self.leak_worker.error_backoff_ms == 0 {
            return Err(RatekeeperError::Config(
                "leak_worker.error_backoff_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
