//! OAuth2 Flows
//!
//! Grant implementations used to acquire tokens.
//!
//! - **Client Credentials Flow** (RFC 6749 Section 4.4): machine-to-machine authentication

pub mod client_credentials;

// Client Credentials Flow
pub use client_credentials::{
    create_mock_client_credentials_flow, ClientCredentialsFlow, ClientCredentialsFlowImpl,
    MockClientCredentialsFlow,
};
