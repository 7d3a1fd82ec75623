//! Sliding window counter (hybrid of fixed windows and a sliding log).

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::{window_index, CheckContext, Strategy};
use crate::error::Result;
use crate::ratelimit::algorithm::Algorithm;
use crate::ratelimit::decision::Decision;
use crate::store::{Pipeline, Store};

/// Estimates the trailing-window count as
/// `current + previous * (1 - elapsed_fraction_of_current_window)`.
///
/// Rejects once the estimate reaches the limit (`>=`, unlike the other
/// algorithms), and only admitted requests are counted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlidingWindowCounter;

async fn read_count(store: &dyn Store, key: &str) -> Result<u64> {
    Ok(store.get(key).await?.and_then(|v| v.parse().ok()).unwrap_or(0))
}

#[async_trait]
impl Strategy for SlidingWindowCounter {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SlidingWindowCounter
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Decision> {
        let window_secs = ctx.limits.window_secs();
        let current_index = window_index(ctx.now, window_secs);
        let current_key = ctx.key.window_key(current_index);
        let previous_key = ctx.key.window_key(current_index - 1);

        let current = read_count(ctx.store, &current_key).await?;
        let previous = read_count(ctx.store, &previous_key).await?;

        let fraction = ctx.now.rem_euclid(window_secs) / window_secs;
        let estimate = current as f64 + previous as f64 * (1.0 - fraction);

        trace!(
            key = %current_key,
            current = current,
            previous = previous,
            estimate = estimate,
            limit = ctx.limits.limit,
            "Sliding counter estimate"
        );

        if estimate >= ctx.limits.limit as f64 {
            return Ok(Decision::over_limit(Algorithm::SlidingWindowCounter));
        }

        // Kept for two windows so it can serve as "previous" next window.
        ctx.store
            .exec(
                Pipeline::new()
                    .incr(&current_key)
                    .expire(&current_key, ctx.limits.expiry(2, Duration::ZERO)),
            )
            .await?;
        Ok(Decision::Allow)
    }
}
