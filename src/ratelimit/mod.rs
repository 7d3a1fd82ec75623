//! Rate limiting logic and state management.

mod algorithm;
mod decision;
mod key;
mod leak;
mod limiter;
mod limits;
mod metrics;
pub mod strategies;

pub use algorithm::Algorithm;
pub use decision::{Decision, FailurePolicy, RejectReason};
pub use key::{client_identity, ClientKey, KEY_PREFIX, UNKNOWN_IDENTITY};
pub use leak::{LeakCycle, LeakWorker, LeakWorkerHandle};
pub use limiter::RateLimiter;
pub use limits::{DynamicConfig, LimitConfig, CONFIG_KEY, DEFAULT_LIMIT, DEFAULT_WINDOW};
pub use metrics::{
    MetricsRecorder, MetricsSnapshot, ACTIVE_IDENTITIES_KEY, TOTAL_REJECTIONS_KEY,
    TOTAL_REQUESTS_KEY,
};
