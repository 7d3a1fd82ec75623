//! Sliding window log.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::{CheckContext, Strategy};
use crate::error::Result;
use crate::ratelimit::algorithm::Algorithm;
use crate::ratelimit::decision::Decision;
use crate::store::{Pipeline, StoreError};

/// Keeps a sorted set of admission timestamps per client.
///
/// Purge, insert, count and expiry run as one pipeline so concurrent checks
/// never read a cardinality that misses each other's inserts. Every attempt is
/// logged, including rejected ones, so a client hammering past the limit keeps
/// itself locked out until its own traffic ages out of the window.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlidingWindowLog;

#[async_trait]
impl Strategy for SlidingWindowLog {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SlidingWindowLog
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Decision> {
        let key = ctx.key.to_store_key();
        let window_start = ctx.now - ctx.limits.window_secs();
        // Identical timestamps share a member and overwrite each other.
        let member = ctx.now.to_string();

        let replies = ctx
            .store
            .exec(
                Pipeline::new()
                    .zremrangebyscore(&key, 0.0, window_start)
                    .zadd(&key, &member, ctx.now)
                    .zcard(&key)
                    .expire(&key, ctx.limits.expiry(1, Duration::from_secs(1))),
            )
            .await?;

        let count = replies
            .get(2)
            .and_then(|r| r.as_count())
            .ok_or_else(|| StoreError::UnexpectedReply(format!("{:?}", replies)))?;

        trace!(key = %key, count = count, limit = ctx.limits.limit, "Sliding log cardinality");

        if count as u64 > ctx.limits.limit {
            return Ok(Decision::over_limit(Algorithm::SlidingWindowLog));
        }
        Ok(Decision::Allow)
    }
}
