//! Configuration Types
//!
//! Client-credentials client configuration types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigurationError;

/// Client-credentials client configuration.
///
/// Immutable once the client is built.
#[derive(Clone)]
pub struct ClientConfig {
    /// Token endpoint URL.
    pub url: String,
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
    /// Value sent as `grant_type`.
    pub grant_type: String,
    /// Value sent as `audience`.
    pub audience: String,
    /// Body encoding of the token request.
    pub content_type: ContentType,
    /// mTLS material.
    pub cert_data: Option<CertData>,
    /// Extra keys redacted from logged request/response bodies.
    pub redact_keys: Vec<String>,
    /// Seconds subtracted from the token expiry when deciding staleness.
    pub expiration_margin_secs: i64,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Override for server certificate verification. `None` keeps the
    /// historical behaviour: skip verification when `cert_data` is set.
    pub insecure_skip_verify: Option<bool>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: String::new(),
            client_secret: SecretString::new(String::new()),
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
            audience: String::new(),
            content_type: ContentType::default(),
            cert_data: None,
            redact_keys: Vec::new(),
            expiration_margin_secs: 0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            insecure_skip_verify: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .field("audience", &self.audience)
            .field("content_type", &self.content_type)
            .field("cert_data", &self.cert_data)
            .field("redact_keys", &self.redact_keys)
            .field("expiration_margin_secs", &self.expiration_margin_secs)
            .field("timeout", &self.timeout)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// Client certificate material for mutual TLS.
#[derive(Clone, Deserialize)]
pub struct CertData {
    /// Base64-encoded PEM private key.
    pub client_crt_key: SecretString,
    /// Base64-encoded PEM certificate.
    pub client_crt: String,
}

impl CertData {
    pub fn new(client_crt_key: impl Into<String>, client_crt: impl Into<String>) -> Self {
        Self {
            client_crt_key: SecretString::new(client_crt_key.into()),
            client_crt: client_crt.into(),
        }
    }
}

impl fmt::Debug for CertData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertData")
            .field("client_crt_key", &"[REDACTED]")
            .field("client_crt", &format_args!("<{} bytes>", self.client_crt.len()))
            .finish()
    }
}

/// Token request body encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// JSON object, all fields always present.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`, empty fields omitted.
    FormUrlEncoded,
}

impl ContentType {
    /// `Content-Type` header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=UTF-8",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ConfigurationError;

    /// Accepts MIME types (parameters ignored) and the short names
    /// `json` / `form`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "" | "json" | "application/json" => Ok(Self::Json),
            "form" | "form-urlencoded" | "application/x-www-form-urlencoded" => {
                Ok(Self::FormUrlEncoded)
            }
            _ => Err(ConfigurationError::UnsupportedContentType {
                content_type: s.to_string(),
            }),
        }
    }
}

/// Default configuration values.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
