//! Effective limit resolution.
//!
//! Every check and every leak worker cycle asks [`DynamicConfig::resolve`] for
//! the limit and window to apply. An administrative update persists an
//! override in the store, so all engines sharing the store pick it up on
//! their next read without a restart.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{RatekeeperError, Result};
use crate::store::Store;

/// Store key holding the dynamic override.
pub const CONFIG_KEY: &str = "config:rate_limit";

/// Default rate limit when no specific limit is configured.
pub const DEFAULT_LIMIT: u64 = 10;
/// Default time window when no specific window is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
/// Longest accepted window. Per-client state lives for at most a few windows,
/// and those expiries must stay representable.
pub const MAX_WINDOW: Duration = Duration::from_secs(u32::MAX as u64);

/// The limit and window applied to a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    /// Maximum requests allowed in the window
    pub limit: u64,
    /// Time window for the limit
    pub window: Duration,
}

impl LimitConfig {
    /// Create a validated limit configuration.
    pub fn new(limit: u64, window: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(RatekeeperError::Config("limit must be positive".to_string()));
        }
        if window.is_zero() {
            return Err(RatekeeperError::Config("window must be positive".to_string()));
        }
        if window > MAX_WINDOW {
            return Err(RatekeeperError::Config(format!(
                "window must not exceed {} seconds",
                MAX_WINDOW.as_secs()
            )));
        }
        Ok(Self { limit, window })
    }

    /// Create a validated configuration from a window in whole seconds.
    pub fn from_secs(limit: u64, window_secs: u64) -> Result<Self> {
        Self::new(limit, Duration::from_secs(window_secs))
    }

    /// Window length in fractional seconds.
    pub fn window_secs(&self) -> f64 {
        self.window.as_secs_f64()
    }

    /// Expiry for state that must outlive `windows` windows plus `grace`.
    pub fn expiry(&self, windows: u32, grace: Duration) -> Duration {
        self.window.saturating_mul(windows).saturating_add(grace)
    }

    /// Cadence at which the leak worker drains one entry per queue.
    pub fn leak_interval(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.window_secs() / self.limit as f64)
            .map_err(|e| RatekeeperError::Config(format!("invalid leak interval: {}", e)))
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Persisted form of the override. Missing fields fall back to the defaults.
#[derive(Debug, Serialize, Deserialize)]
struct StoredOverride {
    #[serde(default)]
    limit: Option<u64>,
    /// Window in whole seconds
    #[serde(default)]
    window: Option<u64>,
}

/// Provider of the effective configuration: the stored override when present
/// and valid, the static defaults otherwise.
#[derive(Debug, Clone)]
pub struct DynamicConfig {
    store: Arc<dyn Store>,
    defaults: LimitConfig,
}

impl DynamicConfig {
    pub fn new(store: Arc<dyn Store>, defaults: LimitConfig) -> Self {
        Self { store, defaults }
    }

    /// The static defaults supplied at construction.
    pub fn defaults(&self) -> LimitConfig {
        self.defaults
    }

    /// Resolve the configuration to apply right now.
    ///
    /// Never fails: an absent, malformed or unreadable override yields the
    /// static defaults.
    pub async fn resolve(&self) -> LimitConfig {
        match self.load_override().await {
            Ok(Some(config)) => config,
            Ok(None) => self.defaults,
            Err(e) => {
                warn!(error = %e, "Falling back to static rate limit defaults");
                self.defaults
            }
        }
    }

    /// Read the stored override, surfacing every failure.
    pub async fn load_override(&self) -> Result<Option<LimitConfig>> {
        let raw = match self.store.get(CONFIG_KEY).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let stored: StoredOverride = serde_json::from_str(&raw)?;
        let limit = stored.limit.unwrap_or(self.defaults.limit);
        let window = stored
            .window
            .map(Duration::from_secs)
            .unwrap_or(self.defaults.window);

        let config = LimitConfig::new(limit, window)?;
        debug!(limit = config.limit, window = ?config.window, "Loaded dynamic rate limit override");
        Ok(Some(config))
    }

    /// Replace the override. Both values must be positive; the previous
    /// override is untouched on error.
    pub async fn update(&self, limit: u64, window_secs: u64) -> Result<LimitConfig> {
        let config = LimitConfig::from_secs(limit, window_secs)?;
        let encoded = serde_json::to_string(&StoredOverride {
            limit: Some(limit),
            window: Some(window_secs),
        })?;
        self.store.set(CONFIG_KEY, &encoded, None).await?;

        info!(limit = limit, window_secs = window_secs, "Updated dynamic rate limit configuration");
        Ok(config)
    }
}
