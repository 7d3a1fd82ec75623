//! Fixed window counter.

use async_trait::async_trait;
use tracing::trace;

use super::{window_index, CheckContext, Strategy};
use crate::error::Result;
use crate::ratelimit::algorithm::Algorithm;
use crate::ratelimit::decision::Decision;

/// Counts requests per `floor(now / window)` index.
///
/// A client straddling a boundary can be admitted up to twice the limit within
/// one window length.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedWindow;

#[async_trait]
impl Strategy for FixedWindow {
    fn algorithm(&self) -> Algorithm {
        Algorithm::FixedWindow
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Decision> {
        let index = window_index(ctx.now, ctx.limits.window_secs());
        let key = ctx.key.window_key(index);

        let count = ctx.store.incr(&key).await?;
        if count == 1 {
            // First hit of this window; let idle windows clean themselves up.
            ctx.store.expire(&key, ctx.limits.window).await?;
        }

        trace!(key = %key, count = count, limit = ctx.limits.limit, "Fixed window count");

        if u64::try_from(count).unwrap_or(0) > ctx.limits.limit {
            return Ok(Decision::over_limit(Algorithm::FixedWindow));
        }
        Ok(Decision::Allow)
    }
}
