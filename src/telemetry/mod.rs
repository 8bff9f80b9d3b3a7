//! Telemetry
//!
//! Observability for token requests.
//!
//! - **Logging**: `tracing` events and spans around token endpoint calls
//! - **Redaction**: masking of credentials in logged payloads

pub mod logging;
pub mod redaction;

pub use logging::LoggingHttpTransport;
pub use redaction::{Redactor, DEFAULT_REDACT_KEYS, REDACTED};
