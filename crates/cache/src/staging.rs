//! Bind staging store
//!
//! Parks an external-identity payload behind a random one-time token between
//! the provider callback and the follow-up bind or registration request.

use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{CacheError, ExpiringStore};

/// How long a staged payload stays consumable.
pub const STAGING_TTL: Duration = Duration::from_secs(600);

/// Staging-token entropy in bytes (hex-encoded on the wire).
const TOKEN_BYTES: usize = 24;

const KEY_PREFIX: &str = "oauth:bind:";

/// External-identity payload staged between callback and bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedIdentity {
    pub provider: String,
    pub provider_id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub id_token: String,
    pub access_token: String,
}

/// Bind-staging namespace over the expiring store.
#[derive(Clone)]
pub struct BindStaging {
    store: Arc<dyn ExpiringStore>,
    ttl: Duration,
}

impl BindStaging {
    pub fn new(store: Arc<dyn ExpiringStore>) -> Self {
        Self {
            store,
            ttl: STAGING_TTL,
        }
    }

    fn key(token: &str) -> String {
        format!("{KEY_PREFIX}{token}")
    }

    /// Stage a payload and return the freshly generated token.
    pub async fn stage(&self, identity: &StagedIdentity) -> Result<String, CacheError> {
        let mut raw = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut raw);
        let token = hex::encode(raw);

        let blob = serde_json::to_string(identity)?;
        self.store.set(&Self::key(&token), &blob, self.ttl).await?;
        Ok(token)
    }

    /// Read and delete the payload behind `token`.
    ///
    /// Returns `None` for an absent, expired, or already-consumed token. The
    /// read and the delete are not atomic: two consumers racing on the same
    /// token before the delete lands can both observe the payload. That is
    /// acceptable because the payload is non-destructive to read twice and
    /// the TTL provides a secondary bound; deletion failure is therefore only
    /// logged, never propagated.
    pub async fn consume(&self, token: &str) -> Result<Option<StagedIdentity>, CacheError> {
        let key = Self::key(token);
        let Some(blob) = self.store.get(&key).await? else {
            return Ok(None);
        };

        if let Err(e) = self.store.delete(&key).await {
            tracing::warn!(error = %e, "failed to delete consumed bind staging entry");
        }

        let identity = serde_json::from_str(&blob)?;
        Ok(Some(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn sample_identity() -> StagedIdentity {
        StagedIdentity {
            provider: "google".to_string(),
            provider_id: "sub123".to_string(),
            email: "a@b.com".to_string(),
            name: "Alice".to_string(),
            avatar: "https://lh3.example.com/photo.jpg".to_string(),
            id_token: "idtok".to_string(),
            access_token: "acctok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stage_then_consume_roundtrip() {
        let staging = BindStaging::new(Arc::new(MemoryStore::new()));
        let identity = sample_identity();

        let token = staging.stage(&identity).await.unwrap();
        // 24 bytes of entropy, hex-encoded
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let consumed = staging.consume(&token).await.unwrap();
        assert_eq!(consumed, Some(identity));
    }

    #[tokio::test]
    async fn test_second_consume_fails() {
        let staging = BindStaging::new(Arc::new(MemoryStore::new()));

        let token = staging.stage(&sample_identity()).await.unwrap();
        assert!(staging.consume(&token).await.unwrap().is_some());
        assert!(staging.consume(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_fails() {
        let staging = BindStaging::new(Arc::new(MemoryStore::new()));
        let missing = staging.consume(&"0".repeat(48)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_staging_fails() {
        let staging = BindStaging::new(Arc::new(MemoryStore::new()));

        let token = staging.stage(&sample_identity()).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(staging.consume(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let staging = BindStaging::new(Arc::new(MemoryStore::new()));
        let a = staging.stage(&sample_identity()).await.unwrap();
        let b = staging.stage(&sample_identity()).await.unwrap();
        assert_ne!(a, b);
    }
}
