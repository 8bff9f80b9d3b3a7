//! Integration tests for token acquisition and caching

use super::*;
use chrono::{Duration, Utc};
use futures::future::join_all;
use oauth2_client_credentials::{NetworkError, OAuth2Error, ProtocolError, ProviderError};
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::Mock;

#[tokio::test]
async fn test_form_encoded_request() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(
            "audience=A&client_id=C&client_secret=S&grant_type=G",
        ))
        .respond_with(token_response("T", 100))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::FormUrlEncoded));

    let before = Utc::now();
    let token = client.get_access_token().await.unwrap();
    let after = Utc::now();

    assert_eq!(token.secret(), "T");
    assert!(token.expires_at() >= before + Duration::seconds(100));
    assert!(token.expires_at() <= after + Duration::seconds(100));
}

#[tokio::test]
async fn test_json_request() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/json; charset=UTF-8"))
        .and(body_json(json!({
            "audience": "A",
            "client_id": "C",
            "client_secret": "S",
            "grant_type": "G",
        })))
        .respond_with(token_response("0000000", 43199))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    let token = client.get_access_token().await.unwrap();
    assert_eq!(token.secret(), "0000000");
    assert_eq!(token.authorization_header(), "Bearer 0000000");
}

#[tokio::test]
async fn test_cached_token_skips_endpoint() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("abc", 300))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    let first = client.get_access_token().await.unwrap();
    for _ in 0..3 {
        let token = client.get_access_token().await.unwrap();
        assert_eq!(token.secret(), "abc");
        assert_eq!(token.expires_at(), first.expires_at());
    }
}

#[tokio::test]
async fn test_expired_token_refreshed() {
    let mock_server = setup_mock_server().await;

    // expires_in = 0 is already stale when checked.
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("short-lived", 0))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    client.get_access_token().await.unwrap();
    client.get_access_token().await.unwrap();
}

#[tokio::test]
async fn test_bad_request_status() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "access_token": "0000000",
            "expires_in": 43199,
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    let error = client.get_access_token().await.unwrap_err();
    assert!(error.to_string().contains("400"));
    assert!(matches!(
        error,
        OAuth2Error::Provider(ProviderError::UnexpectedStatus { status: 400 })
    ));
    assert!(client.cached_token().await.is_none());
}

#[tokio::test]
async fn test_provider_error_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "unknown client",
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    let error = client.get_access_token().await.unwrap_err();
    assert_eq!(error.status_code(), Some(401));
    assert!(matches!(
        error,
        OAuth2Error::Provider(ProviderError::InvalidClient { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_malformed_body() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{"))
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    let error = client.get_access_token().await.unwrap_err();
    assert!(matches!(
        error,
        OAuth2Error::Protocol(ProtocolError::InvalidJson { .. })
    ));
}

#[tokio::test]
async fn test_redirect_not_followed() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "https://elsewhere.example.com/"),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(test_config(&mock_server, ContentType::Json));

    let error = client.get_access_token().await.unwrap_err();
    assert!(matches!(
        error,
        OAuth2Error::Protocol(ProtocolError::UnexpectedRedirect { .. })
    ));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("late", 100).set_delay(std::time::Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server, ContentType::Json);
    config.timeout = std::time::Duration::from_millis(200);
    let client = test_client(config);

    let error = client.get_access_token().await.unwrap_err();
    assert!(matches!(
        error,
        OAuth2Error::Network(NetworkError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let config = client_config()
        .url("http://127.0.0.1:1/oauth/token")
        .build()
        .unwrap();
    let client = test_client(config);

    let error = client.get_access_token().await.unwrap_err();
    assert!(matches!(error, OAuth2Error::Network(_)));
}

#[tokio::test]
async fn test_tls_handshake_with_plain_http_server() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("never", 100))
        .expect(0)
        .mount(&mock_server)
        .await;

    let url = format!(
        "{}{}",
        mock_server.uri().replacen("http://", "https://", 1),
        TOKEN_PATH
    );
    let client = test_client(client_config().url(url).build().unwrap());

    let error = client.get_access_token().await.unwrap_err();
    assert!(matches!(
        error,
        OAuth2Error::Network(NetworkError::ConnectionFailed { .. })
    ));
    assert!(error.is_retryable());
    assert!(client.cached_token().await.is_none());
}

#[tokio::test]
async fn test_unsupported_scheme_not_retryable() {
    let config = client_config()
        .url("ftp://127.0.0.1/oauth/token")
        .build()
        .unwrap();
    let client = test_client(config);

    let error = client.get_access_token().await.unwrap_err();
    assert!(matches!(
        error,
        OAuth2Error::Network(NetworkError::RequestFailed { .. })
    ));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_concurrent_callers_share_request() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            token_response("shared", 3600).set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(test_client(test_config(&mock_server, ContentType::Json)));

    let calls = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get_access_token().await })
    });

    for result in join_all(calls).await {
        assert_eq!(result.unwrap().unwrap().secret(), "shared");
    }
}
