//! Admission outcomes and the store failure policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::algorithm::Algorithm;
use crate::error::RatekeeperError;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The algorithm's budget for this client is exhausted.
    LimitExceeded(Algorithm),
    /// The store failed and the engine runs fail-closed.
    StoreUnavailable(Algorithm),
}

impl RejectReason {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            RejectReason::LimitExceeded(a) | RejectReason::StoreUnavailable(a) => *a,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::LimitExceeded(a) => write!(f, "Too Many Requests ({})", a.label()),
            RejectReason::StoreUnavailable(a) => {
                write!(f, "Rate limit store unavailable ({})", a.label())
            }
        }
    }
}

/// Result of one admission check.
///
/// Rejection is an ordinary outcome; only the caller's outer layer should turn
/// it into a "too many requests" response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Reject(RejectReason),
}

impl Decision {
    /// Shorthand for a limit-exceeded rejection.
    pub fn over_limit(algorithm: Algorithm) -> Self {
        Decision::Reject(RejectReason::LimitExceeded(algorithm))
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_allowed()
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Decision::Allow => None,
            Decision::Reject(reason) => Some(*reason),
        }
    }
}

/// What a check returns when the store fails mid-decision.
///
/// Applied identically to every algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Admit the request.
    #[default]
    Open,
    /// Reject the request with [`RejectReason::StoreUnavailable`].
    Closed,
}

impl FailurePolicy {
    /// Turn a failed check into a decision, logging the failure.
    pub fn decide(&self, algorithm: Algorithm, identity: &str, error: &RatekeeperError) -> Decision {
        warn!(
            algorithm = %algorithm,
            identity = %identity,
            policy = ?self,
            error = %error,
            "Rate limit check failed, applying failure policy"
        );
        match self {
            FailurePolicy::Open => Decision::Allow,
            FailurePolicy::Closed => Decision::Reject(RejectReason::StoreUnavailable(algorithm)),
        }
    }
}
