//! Leaky bucket (queue variant).

use async_trait::async_trait;
use tracing::trace;

use super::{CheckContext, Strategy};
use crate::error::Result;
use crate::ratelimit::algorithm::Algorithm;
use crate::ratelimit::decision::Decision;
use crate::store::{Pipeline, Reply, StoreError};

/// Set of every queue key the leak worker must drain.
pub const ACTIVE_QUEUES_KEY: &str = "active_leaky_buckets";

/// Admits a request by enqueueing its timestamp, as long as the client's
/// queue holds fewer than `limit` entries.
///
/// The check path never dequeues; capacity only comes back when the leak
/// worker drains the queue. The capped push and the registration in the
/// active set run as one pipeline, so concurrent checks cannot overfill the
/// queue and no queued entry is left where the worker cannot see it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeakyBucket;

#[async_trait]
impl Strategy for LeakyBucket {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LeakyBucket
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Decision> {
        let key = ctx.key.to_store_key();
        let cap = usize::try_from(ctx.limits.limit).unwrap_or(usize::MAX);

        // A full queue is already non-empty, so registering it on rejection
        // only repairs a registration that was lost.
        let replies = ctx
            .store
            .exec(
                Pipeline::new()
                    .lpush_capped(&key, &ctx.now.to_string(), cap)
                    .sadd(ACTIVE_QUEUES_KEY, &key),
            )
            .await?;

        match replies.first() {
            Some(Reply::Pushed(None)) => Ok(Decision::over_limit(Algorithm::LeakyBucket)),
            Some(Reply::Pushed(Some(len))) => {
                trace!(key = %key, queued = len, limit = ctx.limits.limit, "Leaky bucket enqueued");
                Ok(Decision::Allow)
            }
            _ => Err(StoreError::UnexpectedReply(format!("{:?}", replies)).into()),
        }
    }
}
