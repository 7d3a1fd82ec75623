//! Rate limiting algorithm selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RatekeeperError;

/// The five interchangeable admission algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Counter per fixed window index
    #[default]
    FixedWindow,
    /// Sorted log of admission timestamps
    SlidingWindowLog,
    /// Weighted blend of the current and previous window counters
    SlidingWindowCounter,
    /// Refilling bucket of fractional tokens
    TokenBucket,
    /// Bounded queue drained by the leak worker
    LeakyBucket,
}

impl Algorithm {
    /// Every algorithm, in a stable order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::FixedWindow,
        Algorithm::SlidingWindowLog,
        Algorithm::SlidingWindowCounter,
        Algorithm::TokenBucket,
        Algorithm::LeakyBucket,
    ];

    /// The wire name used in store keys and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::FixedWindow => "fixed_window",
            Algorithm::SlidingWindowLog => "sliding_window_log",
            Algorithm::SlidingWindowCounter => "sliding_window_counter",
            Algorithm::TokenBucket => "token_bucket",
            Algorithm::LeakyBucket => "leaky_bucket",
        }
    }

    /// Human readable name, used in rejection messages.
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::FixedWindow => "Fixed Window",
            Algorithm::SlidingWindowLog => "Sliding Window Log",
            Algorithm::SlidingWindowCounter => "Sliding Window Counter",
            Algorithm::TokenBucket => "Token Bucket",
            Algorithm::LeakyBucket => "Leaky Bucket",
        }
    }

    /// Resolve a caller supplied name, falling back to [`Algorithm::FixedWindow`]
    /// for anything unrecognized.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(Algorithm::FixedWindow)
    }
}

impl FromStr for Algorithm {
    type Err = RatekeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RatekeeperError::Config(format!("unknown algorithm: {}", s)))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
