//! Core rate limiter implementation.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

use super::algorithm::Algorithm;
use super::decision::{Decision, FailurePolicy};
use super::key::ClientKey;
use super::leak::{LeakWorker, LeakWorkerHandle};
use super::limits::{DynamicConfig, LimitConfig};
use super::metrics::{MetricsRecorder, MetricsSnapshot};
use super::strategies::{strategy_for, CheckContext};
use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::store::Store;

/// Default pause after a failed leak worker cycle.
const DEFAULT_LEAK_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// The admission engine.
///
/// Holds no per-client state of its own: every decision is delegated to a
/// strategy operating on the shared store, so any number of engines (and
/// tasks) may check the same clients concurrently. Share it behind an `Arc`.
pub struct RateLimiter {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    limits: DynamicConfig,
    metrics: MetricsRecorder,
    failure_policy: FailurePolicy,
    leak_error_backoff: Duration,
}

impl RateLimiter {
    /// Create a rate limiter over `store` with static default limits.
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, defaults: LimitConfig) -> Self {
        Self {
            limits: DynamicConfig::new(store.clone(), defaults),
            metrics: MetricsRecorder::new(store.clone()),
            store,
            clock,
            failure_policy: FailurePolicy::default(),
            leak_error_backoff: DEFAULT_LEAK_ERROR_BACKOFF,
        }
    }

    /// Create a rate limiter from the service configuration.
    pub fn from_config(
        config: &ServiceConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let defaults = config.rate_limiting.limits()?;
        Ok(Self::new(store, clock, defaults)
            .with_failure_policy(config.rate_limiting.failure_policy)
            .with_leak_error_backoff(config.leak_worker.error_backoff()))
    }

    /// Set what a check returns when the store fails.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the pause after a failed leak worker cycle.
    pub fn with_leak_error_backoff(mut self, backoff: Duration) -> Self {
        self.leak_error_backoff = backoff;
        self
    }

    /// Check whether a request from `identity` is admitted under `algorithm`.
    ///
    /// Store failures are resolved by the configured [`FailurePolicy`].
    pub async fn check(&self, identity: &str, algorithm: Algorithm) -> Decision {
        let decision = match self.evaluate(identity, algorithm).await {
            Ok(decision) => decision,
            Err(e) => self.failure_policy.decide(algorithm, identity, &e),
        };
        self.finish(identity, algorithm, decision).await
    }

    /// Like [`check`](Self::check), resolving the algorithm by name.
    /// Unknown names use the fixed window.
    pub async fn check_named(&self, identity: &str, algorithm: &str) -> Decision {
        self.check(identity, Algorithm::from_name(algorithm)).await
    }

    /// Check without applying the failure policy; store failures are returned.
    pub async fn try_check(&self, identity: &str, algorithm: Algorithm) -> Result<Decision> {
        let decision = self.evaluate(identity, algorithm).await?;
        Ok(self.finish(identity, algorithm, decision).await)
    }

    async fn evaluate(&self, identity: &str, algorithm: Algorithm) -> Result<Decision> {
        let limits = self.limits.resolve().await;

        // Offered load is recorded before the decision.
        self.metrics.record_request(identity).await;

        let key = ClientKey::new(algorithm, identity);
        trace!(
            key = %key,
            limit = limits.limit,
            window = ?limits.window,
            "Checking rate limit"
        );

        let ctx = CheckContext {
            store: self.store.as_ref(),
            key: &key,
            limits,
            now: self.clock.now(),
        };
        strategy_for(algorithm).check(&ctx).await
    }

    async fn finish(&self, identity: &str, algorithm: Algorithm, decision: Decision) -> Decision {
        if let Decision::Reject(reason) = decision {
            debug!(
                identity = %identity,
                algorithm = %algorithm,
                reason = %reason,
                "Rate limit exceeded"
            );
            self.metrics.record_rejection().await;
        }
        decision
    }

    /// Replace the dynamic limit/window override used by subsequent checks
    /// and leak worker cycles.
    pub async fn update_config(&self, limit: u64, window_secs: u64) -> Result<LimitConfig> {
        self.limits.update(limit, window_secs).await
    }

    /// The limit and window the next check will use.
    pub async fn effective_config(&self) -> LimitConfig {
        self.limits.resolve().await
    }

    /// The static defaults supplied at construction.
    pub fn default_config(&self) -> LimitConfig {
        self.limits.defaults()
    }

    /// Read the global counters.
    pub async fn metrics(&self) -> Result<MetricsSnapshot> {
        self.metrics.snapshot().await
    }

    /// Flush every key of the store: per-client state, metrics and the
    /// dynamic override alike.
    pub async fn reset(&self) -> Result<()> {
        self.store.flush_all().await?;
        info!("Rate limiter state reset");
        Ok(())
    }

    /// Build a leak worker sharing this limiter's store and configuration.
    pub fn leak_worker(&self) -> LeakWorker {
        LeakWorker::new(self.store.clone(), self.limits.clone(), self.leak_error_backoff)
    }

    /// Spawn the leak worker on the current tokio runtime.
    pub fn spawn_leak_worker(&self) -> LeakWorkerHandle {
        self.leak_worker().spawn()
    }

    /// Get the shared store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Release the store connection. Later checks hit the failure policy.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.close().await?;
        info!("Rate limiter shut down");
        Ok(())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("defaults", &self.limits.defaults())
            .field("failure_policy", &self.failure_policy)
            .field("leak_error_backoff", &self.leak_error_backoff)
            .finish()
    }
}
