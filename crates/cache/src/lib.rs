//! Gatehouse expiring key-value capability
//!
//! One generic expiring store backs two key namespaces:
//! - `code:<email>` — one-time verification codes (3 minute TTL)
//! - `oauth:bind:<token>` — staged external-identity payloads pending a
//!   bind or registration step (10 minute TTL)
//!
//! Production uses Redis; tests and local development use the in-memory
//! backend.

use std::time::Duration;

pub mod codes;
pub mod memory;
pub mod redis;
pub mod staging;

pub use codes::VerificationCodes;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use staging::{BindStaging, StagedIdentity};

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An ephemeral key-value store with per-key expiry.
///
/// Standard TTL semantics: a `set` overwrites any previous value and resets
/// the expiry; `get` returns `None` for absent or expired keys; `delete` is
/// idempotent.
#[async_trait::async_trait]
pub trait ExpiringStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
