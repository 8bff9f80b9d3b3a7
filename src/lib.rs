//! OAuth2 Client Credentials Module
//!
//! Client-credentials (RFC 6749 Section 4.4) token client with an in-memory
//! token cache, lazy refresh and optional mutual TLS.
//!
//! # Features
//!
//! - JSON or form-urlencoded token requests
//! - Single cached token refreshed on demand, with a configurable expiry margin
//! - One token request in flight per client, shared by concurrent callers
//! - Client certificate authentication from base64-encoded PEM material
//! - Request/response logging through `tracing` with secret redaction
//!
//! # Example
//!
//! ```rust,ignore
//! use oauth2_client_credentials::{client_config, ContentType, OAuth2Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = client_config()
//!         .url("https://auth.example.com/oauth/token")
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .audience("https://api.example.com")
//!         .content_type(ContentType::FormUrlEncoded)
//!         .expiration_margin_secs(30)
//!         .build()?;
//!
//!     let client = OAuth2Client::new(config)?;
//!
//!     let token = client.get_access_token().await?;
//!     println!("Authorization: {}", token.authorization_header());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration and token types
//! - `error`: error hierarchy with provider error mapping
//! - `core`: HTTP transport, TLS setup and request body encoding
//! - `flows`: client-credentials token acquisition
//! - `token`: token cache and lock-serialized token manager
//! - `telemetry`: request logging and redaction
//! - `builders`: fluent and environment-based configuration
//! - `client`: high-level client combining all of the above

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{oauth2_client, DefaultTransport, OAuth2Client};

// Re-export builders
pub use builders::{client_config, ClientConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, parse_error_response, CertificateError,
    ConfigurationError, NetworkError, OAuth2Error, OAuth2ErrorResponse, OAuth2Result,
    ProtocolError, ProviderError,
};

// Re-export types
pub use types::{
    // Config
    CertData, ClientConfig, ContentType, DEFAULT_GRANT_TYPE, DEFAULT_TIMEOUT_SECS,
    // Token
    AccessToken, TokenResponse,
};

// Re-export core components
pub use core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport, DEFAULT_MAX_RESPONSE_SIZE,
    // TLS
    TlsConfig,
    // Encoding
    encode_credentials, CredentialsPayload,
};

// Re-export flows
pub use flows::{ClientCredentialsFlow, ClientCredentialsFlowImpl, MockClientCredentialsFlow};

// Re-export token management
pub use token::{
    // Cache
    CacheState, TokenCache,
    // Manager
    DefaultTokenManager, MockTokenManager, TokenManager, TokenManagerConfig,
};

// Re-export telemetry
pub use telemetry::{LoggingHttpTransport, Redactor, DEFAULT_REDACT_KEYS, REDACTED};
