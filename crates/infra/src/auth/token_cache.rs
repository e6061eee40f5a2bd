//! In-memory bearer token cache.
//!
//! Holds the current access token and its expiry as one atomically-updated
//! pair. A safety margin is subtracted at write time so the token is treated
//! as expired before the upstream actually invalidates it. The cache is an
//! explicitly constructed value shared via `Arc` — consumers receive it by
//! injection, never through a global.

use chrono::Utc;
use parking_lot::RwLock;

/// Seconds subtracted from the advertised lifetime when storing a token.
const SAFETY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Default)]
struct TokenState {
    value: String,
    /// Epoch seconds; zero means "never set"
    expires_at: i64,
}

/// Shared token cell guarded by a read-write lock. No I/O, no errors.
#[derive(Debug, Default)]
pub struct TokenCache {
    state: RwLock<TokenState>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token is valid iff it is non-empty and not yet past its
    /// margin-adjusted expiry.
    pub fn is_valid(&self) -> bool {
        let state = self.state.read();
        !state.value.is_empty() && Utc::now().timestamp() < state.expires_at
    }

    /// Current token value; empty string when nothing was ever stored.
    pub fn get(&self) -> String {
        self.state.read().value.clone()
    }

    /// Store a new token, computing `expires_at = now + ttl − margin`.
    /// Value and expiry are always written together.
    pub fn set(&self, value: impl Into<String>, ttl_seconds: u64) {
        let expires_at = Utc::now().timestamp() + ttl_seconds as i64 - SAFETY_MARGIN_SECS;
        let mut state = self.state.write();
        state.value = value.into();
        state.expires_at = expires_at;
    }
}
