//! OAuth2 Core Components
//!
//! HTTP transport, TLS setup and request body encoding.

pub mod encoding;
pub mod tls;
pub mod transport;

pub use encoding::*;
pub use tls::*;
pub use transport::*;
