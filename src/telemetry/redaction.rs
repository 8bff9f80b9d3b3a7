//! Redaction
//!
//! Masks credentials in request and response bodies before they are logged.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use url::form_urlencoded;

/// Keys always redacted.
pub const DEFAULT_REDACT_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "client_assertion",
    "client_secret",
    "id_token",
    "password",
    "refresh_token",
];

/// Replacement for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Case-insensitive key redactor.
#[derive(Clone, Debug)]
pub struct Redactor {
    keys: HashSet<String>,
}

impl Redactor {
    /// Redactor for the default keys plus `extra_keys`.
    pub fn new<I, S>(extra_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = DEFAULT_REDACT_KEYS
            .iter()
            .map(|k| k.to_string())
            .chain(
                extra_keys
                    .into_iter()
                    .map(|k| k.as_ref().trim().to_ascii_lowercase()),
            )
            .filter(|k| !k.is_empty())
            .collect();

        Self { keys }
    }

    /// Whether values under `key` are masked.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.keys.contains(&key.to_ascii_lowercase())
    }

    /// Redact a JSON or form-urlencoded body. Anything else is returned as is.
    pub fn redact_body(&self, body: &str) -> String {
        if body.is_empty() {
            return String::new();
        }

        if let Ok(mut value) = serde_json::from_str::<Value>(body) {
            self.redact_value(&mut value);
            return value.to_string();
        }

        if body.contains('=') {
            return self.redact_form(body);
        }

        body.to_string()
    }

    /// Redact header values, sorted by name for stable output.
    pub fn redact_headers(&self, headers: &HashMap<String, String>) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                let value = if self.is_sensitive(name) {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (name.to_ascii_lowercase(), value)
            })
            .collect()
    }

    fn redact_value(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, nested) in map.iter_mut() {
                    if self.is_sensitive(key) {
                        *nested = Value::String(REDACTED.to_string());
                    } else {
                        self.redact_value(nested);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.redact_value(item)),
            _ => {}
        }
    }

    fn redact_form(&self, body: &str) -> String {
        body.split('&')
            .map(|pair| {
                let raw_key = pair.split_once('=').map_or(pair, |(key, _)| key);
                let sensitive = form_urlencoded::parse(raw_key.as_bytes())
                    .next()
                    .is_some_and(|(key, _)| self.is_sensitive(&key));

                if sensitive {
                    format!("{}={}", raw_key, REDACTED)
                } else {
                    pair.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}
