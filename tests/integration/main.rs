//! Integration tests using WireMock
//!
//! Exercise the full token request cycle against a local HTTP server:
//! request encoding, response decoding, caching and error mapping.

mod mtls;
mod token_requests;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use oauth2_client_credentials::{client_config, ClientConfig, ContentType, OAuth2Client};
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/oauth/token";

/// Helper to start a mock token endpoint
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Configuration pointing at the mock server's token endpoint
pub fn test_config(server: &MockServer, content_type: ContentType) -> ClientConfig {
    client_config()
        .url(format!("{}{}", server.uri(), TOKEN_PATH))
        .client_id("C")
        .client_secret("S")
        .grant_type("G")
        .audience("A")
        .content_type(content_type)
        .build()
        .expect("valid test configuration")
}

/// Client with the default reqwest transport
pub fn test_client(config: ClientConfig) -> OAuth2Client {
    OAuth2Client::new(config).expect("client construction")
}

/// Successful token response
pub fn token_response(access_token: &str, expires_in: u16) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "expires_in": expires_in,
    }))
}

/// Base64 encoding of a PEM fixture
pub fn encoded(pem: &str) -> String {
    STANDARD.encode(pem)
}
