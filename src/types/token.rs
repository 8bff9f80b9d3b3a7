//! Token Types
//!
//! Token endpoint response and the cached access token.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Token response from the token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token. Empty when the server omits it.
    #[serde(default)]
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: u16,
    /// Token type, when the server sends one as a string.
    #[serde(default, deserialize_with = "string_or_none")]
    pub token_type: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

/// Access token held by the cache.
///
/// The token value and its absolute expiry are fixed at creation; a refresh
/// produces a new `AccessToken` instead of mutating this one.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    token_type: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create new access token.
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: SecretString::new(value.into()),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at,
        }
    }

    /// Build from a token response issued at `issued_at`.
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: SecretString::new(response.access_token),
            token_type: response
                .token_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            expires_at: issued_at + Duration::seconds(i64::from(response.expires_in)),
        }
    }

    /// Get token value (for Authorization header).
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Absolute expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Token type, `Bearer` unless the server said otherwise.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// True while `expires_at` is strictly after `now + margin`.
    ///
    /// A deadline beyond the representable range counts as stale for a
    /// positive margin and as valid for a negative one.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match now.checked_add_signed(margin) {
            Some(deadline) => self.expires_at > deadline,
            None => margin < Duration::zero(),
        }
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.value.expose_secret())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

const DEFAULT_TOKEN_TYPE: &str = "Bearer";
