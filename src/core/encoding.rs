//! Request Encoding
//!
//! Serializes client credentials into a token request body.

use serde::Serialize;
use url::form_urlencoded;

use crate::types::ContentType;

/// Credential fields sent to the token endpoint.
///
/// Field order matches the sorted key order used on the wire.
#[derive(Clone, Copy, Serialize)]
pub struct CredentialsPayload<'a> {
    pub audience: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub grant_type: &'a str,
}

impl<'a> CredentialsPayload<'a> {
    fn pairs(&self) -> [(&'static str, &'a str); 4] {
        [
            ("audience", self.audience),
            ("client_id", self.client_id),
            ("client_secret", self.client_secret),
            ("grant_type", self.grant_type),
        ]
    }
}

/// Encode the payload for the given content type.
pub fn encode_credentials(content_type: ContentType, payload: &CredentialsPayload<'_>) -> String {
    match content_type {
        ContentType::FormUrlEncoded => encode_form(payload),
        ContentType::Json => encode_json(payload),
    }
}

fn encode_form(payload: &CredentialsPayload<'_>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in payload.pairs() {
        if !value.is_empty() {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

fn encode_json(payload: &CredentialsPayload<'_>) -> String {
    // A struct of plain strings always serializes.
    serde_json::to_string(payload).unwrap_or_default()
}
