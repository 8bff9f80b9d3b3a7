//! OAuth2 Client
//!
//! Client-credentials token client combining transport, flow and token cache.

use std::sync::Arc;

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::OAuth2Error;
use crate::flows::ClientCredentialsFlowImpl;
use crate::telemetry::{LoggingHttpTransport, Redactor};
use crate::token::{DefaultTokenManager, TokenManager, TokenManagerConfig};
use crate::types::{AccessToken, ClientConfig};

/// Default transport: reqwest wrapped with redacted request logging.
pub type DefaultTransport = LoggingHttpTransport<ReqwestHttpTransport>;

/// OAuth2 client-credentials client.
///
/// Safe to share across tasks. At most one token request is in flight per
/// client; concurrent callers wait for it and reuse its result.
pub struct OAuth2Client<T: HttpTransport = DefaultTransport> {
    config: Arc<ClientConfig>,
    manager: DefaultTokenManager<ClientCredentialsFlowImpl<T>>,
}

impl OAuth2Client<DefaultTransport> {
    /// Create a new client with the default transport.
    ///
    /// Fails if the mTLS material cannot be decoded or parsed, or if the key
    /// does not belong to the certificate.
    pub fn new(config: ClientConfig) -> Result<Self, OAuth2Error> {
        let transport = ReqwestHttpTransport::from_config(&config)?;
        let redactor = Redactor::new(&config.redact_keys);
        Ok(Self::with_transport(
            config,
            LoggingHttpTransport::new(transport, redactor),
        ))
    }
}

impl<T: HttpTransport> OAuth2Client<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let config = Arc::new(config);
        let flow = ClientCredentialsFlowImpl::new(config.clone(), Arc::new(transport));
        let manager = DefaultTokenManager::new(
            flow,
            TokenManagerConfig::from_margin_secs(config.expiration_margin_secs),
        );

        Self { config, manager }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a usable access token, requesting a new one when the cached token
    /// is missing or expires within the configured margin.
    pub async fn get_access_token(&self) -> Result<AccessToken, OAuth2Error> {
        self.manager.get_access_token().await
    }

    /// Cached token, if any, without contacting the endpoint.
    pub async fn cached_token(&self) -> Option<AccessToken> {
        self.manager.get_cached_token().await
    }

    /// Underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        self.manager.flow().transport()
    }
}

/// Create a new OAuth2 client.
pub fn oauth2_client(config: ClientConfig) -> Result<OAuth2Client, OAuth2Error> {
    OAuth2Client::new(config)
}
