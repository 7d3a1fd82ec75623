//! Token bucket.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{CheckContext, Strategy};
use crate::error::Result;
use crate::ratelimit::algorithm::Algorithm;
use crate::ratelimit::decision::Decision;

/// How many times a check re-reads the bucket after losing a write race.
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Persisted bucket state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BucketState {
    tokens: f64,
    /// Epoch seconds of the last admitted request
    last_refill: f64,
}

impl BucketState {
    /// Decode a stored record. Missing or corrupted state is a fresh, full bucket.
    fn load(raw: Option<&str>, capacity: f64, now: f64) -> Self {
        let fresh = BucketState {
            tokens: capacity,
            last_refill: now,
        };
        match raw {
            None => fresh,
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable token bucket state");
                fresh
            }),
        }
    }

    /// Tokens available at `now`, capped at `capacity`.
    fn available(&self, now: f64, capacity: f64, window_secs: f64) -> f64 {
        let elapsed = (now - self.last_refill).max(0.0);
        (self.tokens + elapsed * capacity / window_secs).min(capacity)
    }
}

/// Refills `limit / window` tokens per second up to `limit`; each admitted
/// request spends one.
///
/// A rejection writes nothing, so the refill clock keeps running from the
/// last admission. The write is a compare-and-set against the exact record
/// that was read, which keeps concurrent checks for one client from spending
/// the same token twice.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenBucket;

#[async_trait]
impl Strategy for TokenBucket {
    fn algorithm(&self) -> Algorithm {
        Algorithm::TokenBucket
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Decision> {
        let key = ctx.key.to_store_key();
        let capacity = ctx.limits.limit as f64;
        let window_secs = ctx.limits.window_secs();

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let raw = ctx.store.get(&key).await?;
            let state = BucketState::load(raw.as_deref(), capacity, ctx.now);
            let available = state.available(ctx.now, capacity, window_secs);

            trace!(key = %key, available = available, capacity = capacity, "Token bucket level");

            if available < 1.0 {
                return Ok(Decision::over_limit(Algorithm::TokenBucket));
            }

            let next = serde_json::to_string(&BucketState {
                tokens: available - 1.0,
                last_refill: ctx.now,
            })?;
            let ttl = ctx.limits.expiry(2, Duration::ZERO);
            let committed = ctx
                .store
                .compare_and_set(&key, raw.as_deref(), &next, Some(ttl))
                .await?;
            if committed {
                return Ok(Decision::Allow);
            }

            debug!(key = %key, attempt = attempt, "Token bucket write raced, retrying");
        }

        warn!(key = %key, "Token bucket contention exhausted retries, rejecting");
        Ok(Decision::over_limit(Algorithm::TokenBucket))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::super::test_support::Harness;
    use super::*;
    use crate::clock::ManualClock;
    use crate::ratelimit::key::ClientKey;
    use crate::ratelimit::limits::LimitConfig;
    use crate::store::{MemoryStore, Pipeline, Reply, Store, StoreResult};

    async fn stored_state(harness: &Harness) -> BucketState {
        let raw = harness.store.get(&harness.key.to_store_key()).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_refill_after_six_seconds_yields_one_token() {
        // capacity = 10, window = 60 -> one token every 6 seconds.
        let harness = Harness::new(Algorithm::TokenBucket, 10, 60, 1_000.0);
        assert_eq!(harness.admit_count(10).await, 10);
        assert!(harness.check().await.is_rejected());

        harness.advance(6.0);
        assert!(harness.check().await.is_allowed());
        assert!(harness.check().await.is_rejected());
    }

    #[tokio::test]
    async fn test_rejection_does_not_advance_refill_clock() {
        let harness = Harness::new(Algorithm::TokenBucket, 10, 60, 1_000.0);
        assert_eq!(harness.admit_count(10).await, 10);

        harness.advance(3.0);
        assert!(harness.check().await.is_rejected());
        assert_eq!(stored_state(&harness).await.last_refill, 1_000.0);

        // The half token from the first three seconds is still owed.
        harness.advance(3.0);
        assert!(harness.check().await.is_allowed());
        let state = stored_state(&harness).await;
        assert_eq!(state.tokens, 0.0);
        assert_eq!(state.last_refill, 1_006.0);
    }

    #[tokio::test]
    async fn test_state_expires_after_two_windows() {
        let harness = Harness::new(Algorithm::TokenBucket, 10, 60, 1_000.0);
        harness.check().await;
        let ttl = harness.store.ttl(&harness.key.to_store_key()).await.unwrap();
        assert_eq!(ttl, Some(Duration::from_secs(120)));
    }

    #[tokio::test]
    async fn test_refill_is_capped_at_capacity() {
        let harness = Harness::new(Algorithm::TokenBucket, 3, 60, 1_000.0);
        harness.check().await;
        harness.advance(100.0);
        // A long idle spell refills to capacity and no further.
        assert_eq!(harness.admit_count(5).await, 3);
    }

    #[tokio::test]
    async fn test_corrupted_state_is_a_fresh_bucket() {
        let harness = Harness::new(Algorithm::TokenBucket, 2, 60, 1_000.0);
        harness
            .store
            .set(&harness.key.to_store_key(), "{not json", None)
            .await
            .unwrap();

        assert_eq!(harness.admit_count(3).await, 2);
        assert_eq!(stored_state(&harness).await.tokens, 0.0);
    }

    /// Store whose first `lost_races` compare-and-set calls fail as if
    /// another writer got there first.
    #[derive(Debug)]
    struct ContendedStore {
        inner: MemoryStore,
        lost_races: AtomicUsize,
        attempts: AtomicUsize,
    }

    impl ContendedStore {
        fn new(lost_races: usize) -> Self {
            Self {
                inner: MemoryStore::with_clock(Arc::new(ManualClock::new(1_000.0))),
                lost_races: AtomicUsize::new(lost_races),
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Store for ContendedStore {
        async fn incr(&self, key: &str) -> StoreResult<i64> {
            self.inner.incr(key).await
        }
        async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
            self.inner.expire(key, ttl).await
        }
        async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
            self.inner.ttl(key).await
        }
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
            self.inner.set(key, value, ttl).await
        }
        async fn compare_and_set(
            &self,
            key: &str,
            expected: Option<&str>,
            value: &str,
            ttl: Option<Duration>,
        ) -> StoreResult<bool> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let lost = self
                .lost_races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lost {
                return Ok(false);
            }
            self.inner.compare_and_set(key, expected, value, ttl).await
        }
        async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
            self.inner.zadd(key, member, score).await
        }
        async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> StoreResult<usize> {
            self.inner.zremrangebyscore(key, min, max).await
        }
        async fn zcard(&self, key: &str) -> StoreResult<usize> {
            self.inner.zcard(key).await
        }
        async fn lpush(&self, key: &str, value: &str) -> StoreResult<usize> {
            self.inner.lpush(key, value).await
        }
        async fn lpush_capped(&self, key: &str, value: &str, cap: usize) -> StoreResult<Option<usize>> {
            self.inner.lpush_capped(key, value, cap).await
        }
        async fn rpop(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.rpop(key).await
        }
        async fn llen(&self, key: &str) -> StoreResult<usize> {
            self.inner.llen(key).await
        }
        async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
            self.inner.sadd(key, member).await
        }
        async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
            self.inner.smembers(key).await
        }
        async fn scard(&self, key: &str) -> StoreResult<usize> {
            self.inner.scard(key).await
        }
        async fn exec(&self, pipeline: Pipeline) -> StoreResult<Vec<Reply>> {
            self.inner.exec(pipeline).await
        }
        async fn ping(&self) -> StoreResult<()> {
            self.inner.ping().await
        }
        async fn flush_all(&self) -> StoreResult<()> {
            self.inner.flush_all().await
        }
        async fn close(&self) -> StoreResult<()> {
            self.inner.close().await
        }
    }

    async fn check_contended(store: &ContendedStore) -> Decision {
        let key = ClientKey::new(Algorithm::TokenBucket, "198.51.100.9");
        let ctx = CheckContext {
            store,
            key: &key,
            limits: LimitConfig::from_secs(10, 60).unwrap(),
            now: 1_000.0,
        };
        TokenBucket.check(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_lost_write_race_is_retried() {
        let store = ContendedStore::new(MAX_COMMIT_ATTEMPTS - 1);

        assert_eq!(check_contended(&store).await, Decision::Allow);
        assert_eq!(store.attempts.load(Ordering::SeqCst), MAX_COMMIT_ATTEMPTS);

        let raw = store.get("rate_limit:token_bucket:198.51.100.9").await.unwrap().unwrap();
        let state: BucketState = serde_json::from_str(&raw).unwrap();
        assert_eq!(state.tokens, 9.0);
    }

    #[tokio::test]
    async fn test_exhausted_retries_reject_without_writing() {
        let store = ContendedStore::new(MAX_COMMIT_ATTEMPTS);

        assert_eq!(
            check_contended(&store).await,
            Decision::over_limit(Algorithm::TokenBucket)
        );
        assert_eq!(store.attempts.load(Ordering::SeqCst), MAX_COMMIT_ATTEMPTS);
        assert_eq!(
            store.get("rate_limit:token_bucket:198.51.100.9").await.unwrap(),
            None
        );

        // Once the contention clears the bucket is still full.
        assert_eq!(check_contended(&store).await, Decision::Allow);
    }

    #[test]
    fn test_available_ignores_clock_going_backwards() {
        let state = BucketState {
            tokens: 2.0,
            last_refill: 100.0,
        };
        assert_eq!(state.available(90.0, 10.0, 60.0), 2.0);
        assert_eq!(state.available(106.0, 10.0, 60.0), 3.0);
    }
}
