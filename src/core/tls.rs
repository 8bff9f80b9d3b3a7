//! TLS Configuration
//!
//! Builds the client TLS settings from optional mTLS certificate material.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair};
use secrecy::ExposeSecret;
use tracing::{debug, warn};
use x509_parser::prelude::*;

use crate::error::{CertificateError, OAuth2Error};
use crate::types::{CertData, ClientConfig};

const CERT_FIELD: &str = "client_crt";
const KEY_FIELD: &str = "client_crt_key";

/// TLS settings applied to the reqwest client.
///
/// Without certificate material this is the default: no client identity and
/// server certificates verified against the system roots.
#[derive(Default)]
pub struct TlsConfig {
    identity: Option<reqwest::Identity>,
    root_certificates: Vec<reqwest::Certificate>,
    accept_invalid_certs: bool,
}

impl TlsConfig {
    /// Resolve TLS settings for a client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, OAuth2Error> {
        let mut tls = match &config.cert_data {
            Some(cert_data) => Self::from_cert_data(cert_data)?,
            None => Self::default(),
        };

        if let Some(skip) = config.insecure_skip_verify {
            tls.accept_invalid_certs = skip;
        }

        if tls.accept_invalid_certs {
            warn!("server certificate verification is disabled for the token endpoint");
        }

        Ok(tls)
    }

    /// Decode and validate a base64 PEM certificate/key pair.
    ///
    /// The certificate becomes both the client identity and an extra trust
    /// root. Server verification is skipped, matching the behaviour existing
    /// deployments rely on; `ClientConfig::insecure_skip_verify` overrides it.
    pub fn from_cert_data(data: &CertData) -> Result<Self, CertificateError> {
        let key_pem = decode_base64(KEY_FIELD, data.client_crt_key.expose_secret())?;
        let cert_pem = decode_base64(CERT_FIELD, &data.client_crt)?;

        let cert_block = find_pem_block(&cert_pem, CERT_FIELD, "CERTIFICATE", |label| {
            label == "CERTIFICATE"
        })?;
        let key_block = find_pem_block(&key_pem, KEY_FIELD, "PRIVATE KEY", |label| {
            label.ends_with("PRIVATE KEY")
        })?;

        let spki = certificate_public_key_info(&cert_block)?;
        verify_key_pair(&key_block, &spki)?;

        let mut identity_pem = encode_pem(&cert_block);
        identity_pem.push_str(&encode_pem(&key_block));

        let identity = reqwest::Identity::from_pem(identity_pem.as_bytes()).map_err(|e| {
            CertificateError::Identity {
                message: e.to_string(),
            }
        })?;
        let root = reqwest::Certificate::from_der(&cert_block.contents).map_err(|e| {
            CertificateError::InvalidPem {
                field: CERT_FIELD,
                message: e.to_string(),
            }
        })?;

        debug!("loaded mTLS client certificate");

        Ok(Self {
            identity: Some(identity),
            root_certificates: vec![root],
            accept_invalid_certs: true,
        })
    }

    /// Whether a client identity is presented.
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether server certificate verification is disabled.
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Number of additional trust roots.
    pub fn root_certificate_count(&self) -> usize {
        self.root_certificates.len()
    }

    /// Apply the settings to a reqwest client builder.
    pub fn apply(self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let mut builder = builder
            .use_rustls_tls()
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        for certificate in self.root_certificates {
            builder = builder.add_root_certificate(certificate);
        }

        if let Some(identity) = self.identity {
            builder = builder.identity(identity);
        }

        builder
    }
}

fn decode_base64(field: &'static str, value: &str) -> Result<Vec<u8>, CertificateError> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| CertificateError::InvalidBase64 {
            field,
            message: e.to_string(),
        })
}

/// First PEM block whose label satisfies `wanted`. Other blocks, such as
/// `EC PARAMETERS` ahead of an EC key, are skipped.
fn find_pem_block(
    pem: &[u8],
    field: &'static str,
    expected: &str,
    wanted: impl Fn(&str) -> bool,
) -> Result<Pem, CertificateError> {
    for block in Pem::iter_from_buffer(pem) {
        let block = block.map_err(|e| CertificateError::InvalidPem {
            field,
            message: e.to_string(),
        })?;
        if wanted(&block.label) {
            return Ok(block);
        }
    }

    Err(CertificateError::InvalidPem {
        field,
        message: format!("no {} block found", expected),
    })
}

/// Re-armour a block so only the selected material reaches the TLS stack.
fn encode_pem(block: &Pem) -> String {
    let body = STANDARD.encode(&block.contents);
    let mut pem = format!("-----BEGIN {}-----\n", block.label);
    for line in body.as_bytes().chunks(64) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {}-----\n", block.label));
    pem
}

/// DER SubjectPublicKeyInfo of a certificate block.
fn certificate_public_key_info(block: &Pem) -> Result<Vec<u8>, CertificateError> {
    let (_, cert) = X509Certificate::from_der(&block.contents).map_err(|e| {
        CertificateError::InvalidPem {
            field: CERT_FIELD,
            message: e.to_string(),
        }
    })?;
    Ok(cert.public_key().raw.to_vec())
}

/// Check that the private key block belongs to the certificate whose
/// SubjectPublicKeyInfo is `spki`.
fn verify_key_pair(block: &Pem, spki: &[u8]) -> Result<(), CertificateError> {
    let public_key = match block.label.as_str() {
        "PRIVATE KEY" => pkcs8_public_key(&block.contents)?,
        "RSA PRIVATE KEY" => RsaKeyPair::from_der(&block.contents)
            .map(|key| key.public_key().as_ref().to_vec())
            .map_err(|e| CertificateError::InvalidPem {
                field: KEY_FIELD,
                message: e.to_string(),
            })?,
        "EC PRIVATE KEY" => {
            warn!("SEC1 EC private key, key pair match is left to the TLS handshake");
            return Ok(());
        }
        other => {
            return Err(CertificateError::UnsupportedKey {
                label: other.to_string(),
            })
        }
    };

    if contains_subslice(spki, &public_key) {
        Ok(())
    } else {
        Err(CertificateError::KeyMismatch)
    }
}

fn pkcs8_public_key(der: &[u8]) -> Result<Vec<u8>, CertificateError> {
    let rng = SystemRandom::new();

    for algorithm in [
        &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
        &signature::ECDSA_P384_SHA384_ASN1_SIGNING,
    ] {
        if let Ok(key) = EcdsaKeyPair::from_pkcs8(algorithm, der, &rng) {
            return Ok(key.public_key().as_ref().to_vec());
        }
    }

    if let Ok(key) = RsaKeyPair::from_pkcs8(der) {
        return Ok(key.public_key().as_ref().to_vec());
    }

    if let Ok(key) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der) {
        return Ok(key.public_key().as_ref().to_vec());
    }

    Err(CertificateError::UnsupportedKey {
        label: "PRIVATE KEY".to_string(),
    })
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EC_CERT: &str = include_str!("../../tests/fixtures/client.crt");
    const EC_KEY: &str = include_str!("../../tests/fixtures/client.key");
    const OTHER_KEY: &str = include_str!("../../tests/fixtures/other.key");
    const RSA_CERT: &str = include_str!("../../tests/fixtures/rsa_client.crt");
    const RSA_KEY: &str = include_str!("../../tests/fixtures/rsa_client.key");

    fn cert_data(key: &str, cert: &str) -> CertData {
        CertData::new(STANDARD.encode(key), STANDARD.encode(cert))
    }

    #[test]
    fn test_ec_pkcs8_pair() {
        let tls = TlsConfig::from_cert_data(&cert_data(EC_KEY, EC_CERT)).unwrap();
        assert!(tls.has_identity());
        assert!(tls.accept_invalid_certs());
        assert_eq!(tls.root_certificate_count(), 1);
    }

    #[test]
    fn test_rsa_pkcs1_pair() {
        let tls = TlsConfig::from_cert_data(&cert_data(RSA_KEY, RSA_CERT)).unwrap();
        assert!(tls.has_identity());
    }

    #[test]
    fn test_mismatched_key() {
        let result = TlsConfig::from_cert_data(&cert_data(OTHER_KEY, EC_CERT));
        assert!(matches!(result, Err(CertificateError::KeyMismatch)));

        let result = TlsConfig::from_cert_data(&cert_data(RSA_KEY, EC_CERT));
        assert!(matches!(result, Err(CertificateError::KeyMismatch)));
    }

    #[test]
    fn test_invalid_base64() {
        let data = CertData::new("not base64!!", STANDARD.encode(EC_CERT));
        let result = TlsConfig::from_cert_data(&data);
        assert!(matches!(
            result,
            Err(CertificateError::InvalidBase64 {
                field: "client_crt_key",
                ..
            })
        ));
    }

    fn wrap76(encoded: String) -> String {
        encoded
            .as_bytes()
            .chunks(76)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    #[test]
    fn test_line_wrapped_base64() {
        let data = CertData::new(
            wrap76(STANDARD.encode(EC_KEY)),
            wrap76(STANDARD.encode(EC_CERT)) + "\n",
        );
        let tls = TlsConfig::from_cert_data(&data).unwrap();
        assert!(tls.has_identity());
    }

    #[test]
    fn test_blocks_before_key_and_certificate_skipped() {
        let ec_parameters = "-----BEGIN EC PARAMETERS-----\nBggqhkjOPQMBBw==\n-----END EC PARAMETERS-----\n";
        let key = format!("{}{}", ec_parameters, EC_KEY);
        let cert = format!("{}{}", ec_parameters, EC_CERT);

        let tls = TlsConfig::from_cert_data(&cert_data(&key, &cert)).unwrap();
        assert!(tls.has_identity());
        assert_eq!(tls.root_certificate_count(), 1);
    }

    #[test]
    fn test_missing_key_block() {
        let data = cert_data(EC_CERT, EC_CERT);
        let result = TlsConfig::from_cert_data(&data);
        assert!(matches!(
            result,
            Err(CertificateError::InvalidPem {
                field: "client_crt_key",
                ..
            })
        ));
    }

    #[test]
    fn test_encrypted_key_unsupported() {
        let key = EC_KEY.replace("PRIVATE KEY", "ENCRYPTED PRIVATE KEY");
        let result = TlsConfig::from_cert_data(&cert_data(&key, EC_CERT));
        assert!(matches!(
            result,
            Err(CertificateError::UnsupportedKey { ref label }) if label == "ENCRYPTED PRIVATE KEY"
        ));
    }

    #[test]
    fn test_invalid_pem() {
        let data = cert_data(EC_KEY, "definitely not a certificate");
        let result = TlsConfig::from_cert_data(&data);
        assert!(matches!(
            result,
            Err(CertificateError::InvalidPem {
                field: "client_crt",
                ..
            })
        ));
    }

    #[test]
    fn test_key_passed_as_certificate() {
        let result = TlsConfig::from_cert_data(&cert_data(EC_KEY, EC_KEY));
        assert!(matches!(result, Err(CertificateError::InvalidPem { .. })));
    }

    #[test]
    fn test_from_config_without_cert_data() {
        let tls = TlsConfig::from_config(&ClientConfig::default()).unwrap();
        assert!(!tls.has_identity());
        assert!(!tls.accept_invalid_certs());
        assert_eq!(tls.root_certificate_count(), 0);
    }

    #[test]
    fn test_from_config_verification_override() {
        let config = ClientConfig {
            cert_data: Some(cert_data(EC_KEY, EC_CERT)),
            insecure_skip_verify: Some(false),
            ..Default::default()
        };
        let tls = TlsConfig::from_config(&config).unwrap();
        assert!(tls.has_identity());
        assert!(!tls.accept_invalid_certs());
    }

    #[test]
    fn test_apply_builds_client() {
        let tls = TlsConfig::from_cert_data(&cert_data(EC_KEY, EC_CERT)).unwrap();
        let client = tls.apply(reqwest::Client::builder()).build();
        assert!(client.is_ok());
    }
}
