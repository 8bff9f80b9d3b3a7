//! Token Manager
//!
//! Serves the cached access token and refreshes it once it nears expiry.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::error::OAuth2Error;
use crate::flows::ClientCredentialsFlow;
use crate::token::{CacheState, TokenCache};
use crate::types::AccessToken;

/// Token manager interface.
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Get a valid access token, requesting a new one if the cached token is
    /// missing or stale.
    async fn get_access_token(&self) -> Result<AccessToken, OAuth2Error>;

    /// Cached token without triggering a refresh.
    async fn get_cached_token(&self) -> Option<AccessToken>;
}

/// Token manager configuration.
#[derive(Debug, Clone)]
pub struct TokenManagerConfig {
    /// Subtracted from the token expiry when deciding whether to refresh.
    pub expiration_margin: Duration,
}

impl TokenManagerConfig {
    /// Configuration with a margin given in seconds, saturating at the
    /// largest representable duration.
    pub fn from_margin_secs(secs: i64) -> Self {
        let expiration_margin = Duration::try_seconds(secs).unwrap_or(if secs < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        });
        Self { expiration_margin }
    }
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            expiration_margin: Duration::zero(),
        }
    }
}

/// Default token manager implementation.
///
/// One async mutex guards the cache for the whole check, request and store
/// sequence, so an instance never has more than one token request in flight
/// and calls are served in lock order. Dropping a pending call releases the
/// lock and leaves the cache as it was.
pub struct DefaultTokenManager<F: ClientCredentialsFlow> {
    flow: F,
    manager_config: TokenManagerConfig,
    cache: AsyncMutex<TokenCache>,
}

impl<F: ClientCredentialsFlow> DefaultTokenManager<F> {
    /// Create new token manager with an empty cache.
    pub fn new(flow: F, manager_config: TokenManagerConfig) -> Self {
        Self::with_cache(flow, manager_config, TokenCache::new())
    }

    /// Create token manager around an existing cache.
    pub fn with_cache(flow: F, manager_config: TokenManagerConfig, cache: TokenCache) -> Self {
        Self {
            flow,
            manager_config,
            cache: AsyncMutex::new(cache),
        }
    }

    /// Underlying flow.
    pub fn flow(&self) -> &F {
        &self.flow
    }

    /// Manager configuration.
    pub fn config(&self) -> &TokenManagerConfig {
        &self.manager_config
    }
}

#[async_trait]
impl<F: ClientCredentialsFlow> TokenManager for DefaultTokenManager<F> {
    async fn get_access_token(&self) -> Result<AccessToken, OAuth2Error> {
        let mut cache = self.cache.lock().await;

        let state = cache.state(Utc::now(), self.manager_config.expiration_margin);
        if let (CacheState::Valid, Some(token)) = (state, cache.current()) {
            debug!("token active, returning");
            return Ok(token.clone());
        }

        debug!(cache_state = state.as_str(), "token expired, creating new token");

        match self.flow.request_token().await {
            Ok(token) => {
                debug!(expires_at = %token.expires_at(), "token acquired");
                cache.replace(token.clone());
                Ok(token)
            }
            Err(error) => {
                warn!(
                    error = %error,
                    error_code = error.error_code(),
                    "token request failed, cached entry left unchanged"
                );
                Err(error)
            }
        }
    }

    async fn get_cached_token(&self) -> Option<AccessToken> {
        self.cache.lock().await.current().cloned()
    }
}

/// Mock token manager for testing.
#[derive(Default)]
pub struct MockTokenManager {
    token: Mutex<Option<AccessToken>>,
    next_error: Mutex<Option<OAuth2Error>>,
    call_count: Mutex<usize>,
}

impl MockTokenManager {
    /// Create new mock token manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token returned by every call.
    pub fn set_token(&self, token: AccessToken) -> &Self {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self
    }

    /// Error returned by the next call.
    pub fn set_next_error(&self, error: OAuth2Error) -> &Self {
        *self.next_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    /// Number of `get_access_token` calls.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenManager for MockTokenManager {
    async fn get_access_token(&self) -> Result<AccessToken, OAuth2Error> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if let Some(error) = self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }

        let token = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(token.unwrap_or_else(|| {
            AccessToken::new("mock-access-token", Utc::now() + Duration::seconds(3600))
        }))
    }

    async fn get_cached_token(&self) -> Option<AccessToken> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Create mock token manager for testing.
pub fn create_mock_token_manager() -> MockTokenManager {
    MockTokenManager::new()
}
