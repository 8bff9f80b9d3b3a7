//! Integration tests for client certificate configuration

use super::*;
use oauth2_client_credentials::{CertData, CertificateError, OAuth2Error};
use wiremock::matchers::{method, path};
use wiremock::Mock;

const EC_CERT: &str = include_str!("../fixtures/client.crt");
const EC_KEY: &str = include_str!("../fixtures/client.key");
const OTHER_KEY: &str = include_str!("../fixtures/other.key");
const RSA_CERT: &str = include_str!("../fixtures/rsa_client.crt");
const RSA_KEY: &str = include_str!("../fixtures/rsa_client.key");

fn config_with_cert(key: String, cert: String) -> ClientConfig {
    client_config()
        .url("http://localhost:1000/oauth/token")
        .cert_data(cert, key)
        .build()
        .unwrap()
}

#[test]
fn test_valid_ec_certificate() {
    let config = config_with_cert(encoded(EC_KEY), encoded(EC_CERT));
    assert!(OAuth2Client::new(config).is_ok());
}

#[test]
fn test_valid_rsa_certificate() {
    let config = config_with_cert(encoded(RSA_KEY), encoded(RSA_CERT));
    assert!(OAuth2Client::new(config).is_ok());
}

#[test]
fn test_line_wrapped_certificate_material() {
    // `base64` CLI output: 76 columns per line.
    let wrap = |encoded: String| {
        encoded
            .as_bytes()
            .chunks(76)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    };
    let config = config_with_cert(wrap(encoded(EC_KEY)), wrap(encoded(EC_CERT)));
    assert!(OAuth2Client::new(config).is_ok());
}

#[test]
fn test_mismatched_key_rejected() {
    let config = config_with_cert(encoded(OTHER_KEY), encoded(EC_CERT));
    let result = OAuth2Client::new(config);
    assert!(matches!(
        result,
        Err(OAuth2Error::Certificate(CertificateError::KeyMismatch))
    ));
}

#[test]
fn test_invalid_base64_rejected() {
    let config = config_with_cert("%%%".to_string(), encoded(EC_CERT));
    let result = OAuth2Client::new(config);
    assert!(matches!(
        result,
        Err(OAuth2Error::Certificate(CertificateError::InvalidBase64 { .. }))
    ));
}

#[test]
fn test_invalid_pem_rejected() {
    let config = config_with_cert(encoded(EC_KEY), encoded("not a certificate"));
    let result = OAuth2Client::new(config);
    match result {
        Err(error) => assert!(error.is_setup_error()),
        Ok(_) => panic!("expected certificate error"),
    }
}

#[tokio::test]
async fn test_token_request_with_client_certificate() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("mtls-token", 600))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server, ContentType::Json);
    config.cert_data = Some(CertData::new(encoded(EC_KEY), encoded(EC_CERT)));
    let client = test_client(config);

    let token = client.get_access_token().await.unwrap();
    assert_eq!(token.secret(), "mtls-token");
}
