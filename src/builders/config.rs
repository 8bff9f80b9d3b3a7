//! Configuration Builder
//!
//! Fluent builder for client-credentials configuration.

use std::time::Duration;

use crate::error::{ConfigurationError, OAuth2Error};
use crate::types::{CertData, ClientConfig, ContentType, DEFAULT_GRANT_TYPE, DEFAULT_TIMEOUT_SECS};
use secrecy::SecretString;

/// Environment variable names read by [`ClientConfigBuilder::from_env`].
pub mod env {
    pub const URL: &str = "OAUTH_URL";
    pub const CLIENT_ID: &str = "OAUTH_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "OAUTH_CLIENT_SECRET";
    pub const GRANT_TYPE: &str = "OAUTH_GRANT_TYPE";
    pub const AUDIENCE: &str = "OAUTH_AUDIENCE";
    pub const CONTENT_TYPE: &str = "OAUTH_CONTENT_TYPE";
    pub const CLIENT_CRT: &str = "OAUTH_CLIENT_CRT";
    pub const CLIENT_CRT_KEY: &str = "OAUTH_CLIENT_CRT_KEY";
    pub const REDACT_KEYS: &str = "OAUTH_REDACT_KEYS";
    pub const EXPIRATION_MARGIN_SECONDS: &str = "OAUTH_EXPIRATION_MARGIN_SECONDS";
    pub const TIMEOUT_SECONDS: &str = "OAUTH_TIMEOUT_SECONDS";
}

/// Client configuration builder.
#[derive(Default)]
pub struct ClientConfigBuilder {
    url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    grant_type: Option<String>,
    audience: Option<String>,
    content_type: Option<String>,
    client_crt: Option<String>,
    client_crt_key: Option<SecretString>,
    redact_keys: Vec<String>,
    expiration_margin_secs: i64,
    timeout: Option<Duration>,
    insecure_skip_verify: Option<bool>,
    invalid: Option<ConfigurationError>,
}

impl ClientConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set token endpoint URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set grant type. Defaults to `client_credentials`.
    pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = Some(grant_type.into());
        self
    }

    /// Set audience.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set request body encoding.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type.as_str().to_string());
        self
    }

    /// Set request body encoding from its MIME type or short name.
    /// Validated in [`build`](Self::build).
    pub fn content_type_str(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set base64-encoded PEM client certificate and private key.
    pub fn cert_data(mut self, client_crt: impl Into<String>, client_crt_key: impl Into<String>) -> Self {
        self.client_crt = Some(client_crt.into());
        self.client_crt_key = Some(SecretString::new(client_crt_key.into()));
        self
    }

    /// Add a key redacted from logged bodies and headers.
    pub fn add_redact_key(mut self, key: impl Into<String>) -> Self {
        self.redact_keys.push(key.into());
        self
    }

    /// Set keys redacted from logged bodies and headers.
    pub fn redact_keys(mut self, keys: Vec<String>) -> Self {
        self.redact_keys = keys;
        self
    }

    /// Set seconds subtracted from token expiry when checking staleness.
    pub fn expiration_margin_secs(mut self, secs: i64) -> Self {
        self.expiration_margin_secs = secs;
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Force server certificate verification on or off.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = Some(skip);
        self
    }

    /// Load configuration from process environment variables.
    pub fn from_env(self) -> Self {
        self.from_env_with(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`. Unset or empty variables leave
    /// the current value in place.
    pub fn from_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(env::URL) {
            self.url = Some(url);
        }
        if let Some(client_id) = get(env::CLIENT_ID) {
            self.client_id = Some(client_id);
        }
        if let Some(secret) = get(env::CLIENT_SECRET) {
            self.client_secret = Some(SecretString::new(secret));
        }
        if let Some(grant_type) = get(env::GRANT_TYPE) {
            self.grant_type = Some(grant_type);
        }
        if let Some(audience) = get(env::AUDIENCE) {
            self.audience = Some(audience);
        }
        if let Some(content_type) = get(env::CONTENT_TYPE) {
            self.content_type = Some(content_type);
        }
        if let Some(crt) = get(env::CLIENT_CRT) {
            self.client_crt = Some(crt);
        }
        if let Some(key) = get(env::CLIENT_CRT_KEY) {
            self.client_crt_key = Some(SecretString::new(key));
        }
        if let Some(keys) = get(env::REDACT_KEYS) {
            self.redact_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(val) = get(env::EXPIRATION_MARGIN_SECONDS) {
            match val.trim().parse() {
                Ok(secs) => self.expiration_margin_secs = secs,
                Err(_) => self.reject(env::EXPIRATION_MARGIN_SECONDS, &val),
            }
        }
        if let Some(val) = get(env::TIMEOUT_SECONDS) {
            match val.trim().parse() {
                Ok(secs) => self.timeout = Some(Duration::from_secs(secs)),
                Err(_) => self.reject(env::TIMEOUT_SECONDS, &val),
            }
        }

        self
    }

    fn reject(&mut self, field: &str, value: &str) {
        self.invalid.get_or_insert(ConfigurationError::InvalidValue {
            field: field.to_string(),
            message: format!("expected an integer, got {:?}", value),
        });
    }

    /// Build configuration.
    pub fn build(self) -> Result<ClientConfig, OAuth2Error> {
        if let Some(invalid) = self.invalid {
            return Err(OAuth2Error::Configuration(invalid));
        }

        let url = self.url.filter(|u| !u.is_empty()).ok_or_else(|| {
            OAuth2Error::Configuration(ConfigurationError::MissingField {
                field: "url".to_string(),
            })
        })?;

        let margin_in_range = chrono::Duration::try_seconds(self.expiration_margin_secs)
            .and_then(|margin| chrono::Utc::now().checked_add_signed(margin))
            .is_some();
        if !margin_in_range {
            return Err(OAuth2Error::Configuration(ConfigurationError::InvalidValue {
                field: "expiration_margin_secs".to_string(),
                message: format!("{} seconds is out of range", self.expiration_margin_secs),
            }));
        }

        let content_type = match self.content_type {
            Some(raw) => raw.parse::<ContentType>().map_err(OAuth2Error::Configuration)?,
            None => ContentType::default(),
        };

        let cert_data = match (self.client_crt, self.client_crt_key) {
            (None, None) => None,
            (Some(crt), Some(key)) => Some(CertData {
                client_crt_key: key,
                client_crt: crt,
            }),
            (Some(_), None) => {
                return Err(OAuth2Error::Configuration(ConfigurationError::MissingField {
                    field: "client_crt_key".to_string(),
                }))
            }
            (None, Some(_)) => {
                return Err(OAuth2Error::Configuration(ConfigurationError::MissingField {
                    field: "client_crt".to_string(),
                }))
            }
        };

        Ok(ClientConfig {
            url,
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self
                .client_secret
                .unwrap_or_else(|| SecretString::new(String::new())),
            grant_type: self
                .grant_type
                .unwrap_or_else(|| DEFAULT_GRANT_TYPE.to_string()),
            audience: self.audience.unwrap_or_default(),
            content_type,
            cert_data,
            redact_keys: self.redact_keys,
            expiration_margin_secs: self.expiration_margin_secs,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            insecure_skip_verify: self.insecure_skip_verify,
        })
    }
}

/// Create a new client configuration builder.
pub fn client_config() -> ClientConfigBuilder {
    ClientConfigBuilder::new()
}
