//! Logging
//!
//! Transport decorator that logs token endpoint traffic through `tracing`.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, debug_span, warn, Instrument};

use crate::core::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::OAuth2Error;
use crate::telemetry::Redactor;

/// Wraps a transport and logs every exchange with credentials redacted.
pub struct LoggingHttpTransport<T: HttpTransport> {
    inner: T,
    redactor: Redactor,
}

impl<T: HttpTransport> LoggingHttpTransport<T> {
    /// Create new logging transport.
    pub fn new(inner: T, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }

    /// Wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Redactor applied to logged bodies and headers.
    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for LoggingHttpTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, OAuth2Error> {
        let span = debug_span!(
            "oauth2.token_request",
            http.method = request.method.as_str(),
            http.url = %request.url,
        );

        async move {
            debug!(
                headers = ?self.redactor.redact_headers(&request.headers),
                body = %self.redactor.redact_body(request.body.as_deref().unwrap_or_default()),
                "sending token request"
            );

            let started = Instant::now();
            let result = self.inner.send(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(response) => debug!(
                    status = response.status,
                    elapsed_ms,
                    body = %self.redactor.redact_body(&response.body),
                    "received token response"
                ),
                Err(error) => warn!(
                    error = %error,
                    error_code = error.error_code(),
                    elapsed_ms,
                    "token request failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}
