//! Token Management
//!
//! In-memory caching and lazy refresh of the client-credentials token.
//!
//! - **Token Cache**: single-slot cache with margin-aware staleness
//! - **Token Manager**: lock-serialized access with refresh on miss

pub mod cache;
pub mod manager;

// Token Cache
pub use cache::{CacheState, TokenCache};

// Token Manager
pub use manager::{
    create_mock_token_manager, DefaultTokenManager, MockTokenManager, TokenManager,
    TokenManagerConfig,
};
