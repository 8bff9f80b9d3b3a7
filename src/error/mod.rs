//! OAuth2 Error Types
//!
//! Error hierarchy for token acquisition. Setup errors (configuration and
//! certificates) surface from client construction; everything else is
//! returned per call and never touches the token cache.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the client-credentials client.
#[derive(Error, Debug)]
pub enum OAuth2Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl OAuth2Error {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "OAUTH2_CONFIG",
            Self::Certificate(_) => "OAUTH2_CERTIFICATE",
            Self::Network(_) => "OAUTH2_NETWORK",
            Self::Protocol(_) => "OAUTH2_PROTOCOL",
            Self::Provider(_) => "OAUTH2_PROVIDER",
        }
    }

    /// Check if the caller may reasonably retry.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status code of the token endpoint response, if the error came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider(e) => Some(e.status()),
            _ => None,
        }
    }

    /// Whether the error happened while setting the client up.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Certificate(_)
                | Self::Configuration(ConfigurationError::MissingField { .. })
                | Self::Configuration(ConfigurationError::UnsupportedContentType { .. })
                | Self::Configuration(ConfigurationError::InvalidValue { .. })
        )
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid endpoint URL {url}: {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

/// Client certificate (mTLS) error.
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Invalid base64 in {field}: {message}")]
    InvalidBase64 { field: &'static str, message: String },

    #[error("Invalid PEM in {field}: {message}")]
    InvalidPem { field: &'static str, message: String },

    #[error("Unsupported private key format: {label}")]
    UnsupportedKey { label: String },

    #[error("Private key does not match the client certificate")]
    KeyMismatch,

    #[error("TLS identity rejected: {message}")]
    Identity { message: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Request failed: {message}")]
    RequestFailed { message: String },
}

impl NetworkError {
    /// Check if error is retryable. A request reqwest refused to build
    /// fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RequestFailed { .. })
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Token endpoint answered with a non-200 status.
///
/// Every variant carries the status code and prints it as `(status=<code>)`.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client credentials (status={status})")]
    InvalidClient {
        status: u16,
        error_description: Option<String>,
    },

    #[error("Invalid grant: {message} (status={status})")]
    InvalidGrant { status: u16, message: String },

    #[error("Invalid request: {message} (status={status})")]
    InvalidRequest { status: u16, message: String },

    #[error("Invalid scope: {scope} (status={status})")]
    InvalidScope { status: u16, scope: String },

    #[error("Unauthorized client for this grant type (status={status})")]
    UnauthorizedClient {
        status: u16,
        error_description: Option<String>,
    },

    #[error("Unsupported grant type: {grant_type} (status={status})")]
    UnsupportedGrantType { status: u16, grant_type: String },

    #[error("Server temporarily unavailable (status={status})")]
    TemporarilyUnavailable {
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("http request error (status={status})")]
    UnexpectedStatus { status: u16 },
}

impl ProviderError {
    /// HTTP status returned by the token endpoint.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidClient { status, .. }
            | Self::InvalidGrant { status, .. }
            | Self::InvalidRequest { status, .. }
            | Self::InvalidScope { status, .. }
            | Self::UnauthorizedClient { status, .. }
            | Self::UnsupportedGrantType { status, .. }
            | Self::TemporarilyUnavailable { status, .. }
            | Self::UnexpectedStatus { status } => *status,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::TemporarilyUnavailable { .. } => true,
            Self::UnexpectedStatus { status } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for OAuth2 operations.
pub type OAuth2Result<T> = Result<T, OAuth2Error>;

/// OAuth2 error response body (RFC 6749 Section 5.2).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Map a token endpoint error body to a provider error.
pub fn map_token_error(status: u16, response: &OAuth2ErrorResponse) -> ProviderError {
    let description = response.error_description.clone();
    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            status,
            error_description: description,
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            status,
            message: description.unwrap_or_else(|| "Invalid grant".to_string()),
        },
        "invalid_scope" => ProviderError::InvalidScope {
            status,
            scope: description.unwrap_or_default(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            status,
            error_description: description,
        },
        "unsupported_grant_type" => ProviderError::UnsupportedGrantType {
            status,
            grant_type: description.unwrap_or_default(),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable {
            status,
            retry_after: None,
        },
        "server_error" => ProviderError::UnexpectedStatus { status },
        _ => ProviderError::InvalidRequest {
            status,
            message: description.unwrap_or_else(|| response.error.clone()),
        },
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create error from a non-200 token endpoint response.
pub fn create_error_from_response(status: u16, body: &str) -> OAuth2Error {
    if let Some(response) = parse_error_response(body) {
        return OAuth2Error::Provider(map_token_error(status, &response));
    }

    let error = match status {
        429 | 503 => ProviderError::TemporarilyUnavailable {
            status,
            retry_after: None,
        },
        _ => ProviderError::UnexpectedStatus { status },
    };

    OAuth2Error::Provider(error)
}
