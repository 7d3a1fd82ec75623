//! Admission algorithms.
//!
//! Each strategy is stateless: everything it knows about a client lives in
//! the store under that client's [`ClientKey`]. Strategies are therefore
//! shared statics, and the engine picks one per request.

mod fixed_window;
mod leaky_bucket;
mod sliding_counter;
mod sliding_log;
mod token_bucket;

pub use fixed_window::FixedWindow;
pub use leaky_bucket::{LeakyBucket, ACTIVE_QUEUES_KEY};
pub use sliding_counter::SlidingWindowCounter;
pub use sliding_log::SlidingWindowLog;
pub use token_bucket::TokenBucket;

use async_trait::async_trait;

use super::algorithm::Algorithm;
use super::decision::Decision;
use super::key::ClientKey;
use super::limits::LimitConfig;
use crate::error::Result;
use crate::store::Store;

/// Everything a strategy needs for one decision.
pub struct CheckContext<'a> {
    pub store: &'a dyn Store,
    pub key: &'a ClientKey,
    pub limits: LimitConfig,
    /// Current time in fractional epoch seconds
    pub now: f64,
}

/// A single admission algorithm.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Decide whether the request described by `ctx` is admitted,
    /// updating the client's state in the store.
    async fn check(&self, ctx: &CheckContext<'_>) -> Result<Decision>;
}

static FIXED_WINDOW: FixedWindow = FixedWindow;
static SLIDING_WINDOW_LOG: SlidingWindowLog = SlidingWindowLog;
static SLIDING_WINDOW_COUNTER: SlidingWindowCounter = SlidingWindowCounter;
static TOKEN_BUCKET: TokenBucket = TokenBucket;
static LEAKY_BUCKET: LeakyBucket = LeakyBucket;

/// The strategy implementing `algorithm`.
pub fn strategy_for(algorithm: Algorithm) -> &'static dyn Strategy {
    match algorithm {
        Algorithm::FixedWindow => &FIXED_WINDOW,
        Algorithm::SlidingWindowLog => &SLIDING_WINDOW_LOG,
        Algorithm::SlidingWindowCounter => &SLIDING_WINDOW_COUNTER,
        Algorithm::TokenBucket => &TOKEN_BUCKET,
        Algorithm::LeakyBucket => &LEAKY_BUCKET,
    }
}

/// Index of the fixed window containing `now`.
pub(crate) fn window_index(now: f64, window_secs: f64) -> i64 {
    (now / window_secs).floor() as i64
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::store::MemoryStore;

    /// A store, a clock and one client key, driven by hand.
    pub struct Harness {
        pub clock: ManualClock,
        pub store: MemoryStore,
        pub key: ClientKey,
        pub limits: LimitConfig,
    }

    impl Harness {
        pub fn new(algorithm: Algorithm, limit: u64, window_secs: u64, start: f64) -> Self {
            let clock = ManualClock::new(start);
            Self {
                store: MemoryStore::with_clock(Arc::new(clock.clone())),
                clock,
                key: ClientKey::new(algorithm, "198.51.100.4"),
                limits: LimitConfig::from_secs(limit, window_secs).unwrap(),
            }
        }

        pub async fn check(&self) -> Decision {
            let ctx = CheckContext {
                store: &self.store,
                key: &self.key,
                limits: self.limits,
                now: self.clock.now(),
            };
            strategy_for(self.key.algorithm).check(&ctx).await.unwrap()
        }

        /// Run `n` checks and count the admitted ones.
        pub async fn admit_count(&self, n: usize) -> usize {
            let mut admitted = 0;
            for _ in 0..n {
                if self.check().await.is_allowed() {
                    admitted += 1;
                }
            }
            admitted
        }

        pub fn advance(&self, secs: f64) {
            self.clock.advance(Duration::from_secs_f64(secs));
        }
    }
}
