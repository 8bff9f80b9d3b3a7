//! Token Cache
//!
//! Single-slot cache holding the current access token.

use chrono::{DateTime, Duration, Utc};

use crate::types::AccessToken;

/// State of the cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing fetched yet.
    Empty,
    /// Token expires after `now + margin`.
    Valid,
    /// Token expires at or before `now + margin`.
    Stale,
}

impl CacheState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Valid => "valid",
            Self::Stale => "stale",
        }
    }

    /// Whether a new token must be requested.
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Valid)
    }
}

/// Holds at most one token. The entry is only ever replaced as a whole.
#[derive(Debug, Default)]
pub struct TokenCache {
    entry: Option<AccessToken>,
}

impl TokenCache {
    /// Create empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with `token`.
    pub fn with_token(token: AccessToken) -> Self {
        Self { entry: Some(token) }
    }

    /// Classify the cached entry.
    pub fn state(&self, now: DateTime<Utc>, margin: Duration) -> CacheState {
        match &self.entry {
            None => CacheState::Empty,
            Some(token) if token.is_valid_at(now, margin) => CacheState::Valid,
            Some(_) => CacheState::Stale,
        }
    }

    /// Current entry regardless of state.
    pub fn current(&self) -> Option<&AccessToken> {
        self.entry.as_ref()
    }

    /// Replace the entry with a freshly acquired token.
    pub fn replace(&mut self, token: AccessToken) {
        self.entry = Some(token);
    }
}
