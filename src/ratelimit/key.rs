//! Client key generation and handling.

use super::algorithm::Algorithm;

/// Prefix shared by every per-client key.
pub const KEY_PREFIX: &str = "rate_limit";

/// Identity used when nothing about the caller is known.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// A key that scopes rate limit state to one (algorithm, client) pair.
///
/// Each algorithm owns a distinct namespace, so the same client can be checked
/// against several algorithms without interference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    /// The algorithm this state belongs to
    pub algorithm: Algorithm,
    /// Opaque client identity
    pub identity: String,
}

impl ClientKey {
    pub fn new(algorithm: Algorithm, identity: &str) -> Self {
        Self {
            algorithm,
            identity: identity.to_string(),
        }
    }

    /// The base store key.
    /// Format: "rate_limit:{algorithm}:{identity}"
    pub fn to_store_key(&self) -> String {
        format!("{}:{}:{}", KEY_PREFIX, self.algorithm, self.identity)
    }

    /// The store key for one window index of a windowed counter.
    pub fn window_key(&self, index: i64) -> String {
        format!("{}:{}", self.to_store_key(), index)
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_store_key())
    }
}

/// Derive a client identity from a forwarded-for header value and the
/// transport peer address.
///
/// The first non-empty entry of the forwarded list wins, then the peer,
/// then [`UNKNOWN_IDENTITY`].
pub fn client_identity(forwarded_for: Option<&str>, peer: Option<&str>) -> String {
    forwarded_for
        .and_then(|header| header.split(',').map(str::trim).find(|s| !s.is_empty()))
        .or_else(|| peer.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(UNKNOWN_IDENTITY)
        .to_string()
}
