//! Global request accounting.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::store::Store;

/// Counter of every checked request.
pub const TOTAL_REQUESTS_KEY: &str = "global:total_requests";
/// Counter of every rejected request.
pub const TOTAL_REJECTIONS_KEY: &str = "global:total_429s";
/// Set of every identity seen.
pub const ACTIVE_IDENTITIES_KEY: &str = "global:active_ips";

/// Point-in-time view of the global counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_rejections: u64,
    pub active_identities: usize,
}

/// Records offered load and rejections in the shared store.
///
/// Recording is best-effort: failures are logged and never reach the caller,
/// so metrics can never change an admission decision.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    store: Arc<dyn Store>,
}

impl MetricsRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Count a request and remember its identity.
    pub async fn record_request(&self, identity: &str) {
        if let Err(e) = self.store.incr(TOTAL_REQUESTS_KEY).await {
            warn!(error = %e, "Failed to record request");
        }
        if let Err(e) = self.store.sadd(ACTIVE_IDENTITIES_KEY, identity).await {
            warn!(error = %e, identity = %identity, "Failed to record active identity");
        }
    }

    /// Count a rejection.
    pub async fn record_rejection(&self) {
        if let Err(e) = self.store.incr(TOTAL_REJECTIONS_KEY).await {
            warn!(error = %e, "Failed to record rejection");
        }
    }

    /// Read the counters. Not isolated from concurrent writers.
    pub async fn snapshot(&self) -> Result<MetricsSnapshot> {
        let total_requests = self.read_counter(TOTAL_REQUESTS_KEY).await?;
        let total_rejections = self.read_counter(TOTAL_REJECTIONS_KEY).await?;
        let active_identities = self.store.scard(ACTIVE_IDENTITIES_KEY).await?;

        Ok(MetricsSnapshot {
            total_requests,
            total_rejections,
            active_identities,
        })
    }

    async fn read_counter(&self, key: &str) -> Result<u64> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }
}
