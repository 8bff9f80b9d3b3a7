//! Client Credentials Flow
//!
//! RFC 6749 Section 4.4 - Client Credentials Grant.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::{encode_credentials, CredentialsPayload, HttpMethod, HttpRequest, HttpTransport};
use crate::error::{create_error_from_response, ConfigurationError, OAuth2Error, ProtocolError};
use crate::types::{AccessToken, ClientConfig, TokenResponse};

/// Client Credentials Flow interface.
#[async_trait]
pub trait ClientCredentialsFlow: Send + Sync {
    /// Request a new access token from the token endpoint.
    async fn request_token(&self) -> Result<AccessToken, OAuth2Error>;
}

/// Client Credentials Flow implementation.
pub struct ClientCredentialsFlowImpl<T: HttpTransport> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
}

impl<T: HttpTransport> ClientCredentialsFlowImpl<T> {
    /// Create new Client Credentials Flow.
    pub fn new(config: Arc<ClientConfig>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    /// Shared transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    fn build_request_body(&self) -> String {
        let payload = CredentialsPayload {
            audience: &self.config.audience,
            client_id: &self.config.client_id,
            client_secret: self.config.client_secret.expose_secret(),
            grant_type: &self.config.grant_type,
        };
        encode_credentials(self.config.content_type, &payload)
    }

    fn build_request_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            self.config.content_type.as_str().to_string(),
        );
        headers.insert("accept".to_string(), "application/json".to_string());
        headers
    }

    fn build_request(&self) -> Result<HttpRequest, OAuth2Error> {
        let url = url::Url::parse(&self.config.url).map_err(|e| {
            OAuth2Error::Configuration(ConfigurationError::InvalidEndpoint {
                url: self.config.url.clone(),
                message: e.to_string(),
            })
        })?;

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: self.build_request_headers(),
            body: Some(self.build_request_body()),
            timeout: Some(self.config.timeout),
        })
    }
}

#[async_trait]
impl<T: HttpTransport> ClientCredentialsFlow for ClientCredentialsFlowImpl<T> {
    async fn request_token(&self) -> Result<AccessToken, OAuth2Error> {
        let http_request = self.build_request()?;

        let response = self.transport.send(http_request).await?;

        if response.status != 200 {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let token_response: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            OAuth2Error::Protocol(ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })?;

        Ok(AccessToken::from_response(token_response, Utc::now()))
    }
}

/// Mock Client Credentials Flow for testing.
#[derive(Default)]
pub struct MockClientCredentialsFlow {
    request_count: Mutex<usize>,
    next_token: Mutex<Option<AccessToken>>,
    next_error: Mutex<Option<OAuth2Error>>,
}

impl MockClientCredentialsFlow {
    /// Create new mock flow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set next token.
    pub fn set_next_token(&self, token: AccessToken) -> &Self {
        *self.next_token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self
    }

    /// Set next error.
    pub fn set_next_error(&self, error: OAuth2Error) -> &Self {
        *self.next_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    /// Number of token requests made.
    pub fn request_count(&self) -> usize {
        *self.request_count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ClientCredentialsFlow for MockClientCredentialsFlow {
    async fn request_token(&self) -> Result<AccessToken, OAuth2Error> {
        *self.request_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if let Some(error) = self
            .next_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(error);
        }

        if let Some(token) = self
            .next_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Ok(token);
        }

        Ok(AccessToken::new(
            "mock-client-credentials-token",
            Utc::now() + Duration::seconds(3600),
        ))
    }
}

/// Create mock Client Credentials Flow for testing.
pub fn create_mock_client_credentials_flow() -> MockClientCredentialsFlow {
    MockClientCredentialsFlow::new()
}
