//! Verification-code store
//!
//! One 6-digit numeric code per recipient email, valid for a short window.
//! Re-requesting a code overwrites the previous one; concurrent requests for
//! the same address race on the overwrite and the last writer wins, which is
//! consistent with "only the latest code is valid".

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::{CacheError, ExpiringStore};

/// How long an issued code stays valid.
pub const CODE_TTL: Duration = Duration::from_secs(180);

const CODE_LEN: usize = 6;

/// Generate a random 6-digit numeric code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

/// Verification-code namespace over the expiring store.
#[derive(Clone)]
pub struct VerificationCodes {
    store: Arc<dyn ExpiringStore>,
    ttl: Duration,
}

impl VerificationCodes {
    pub fn new(store: Arc<dyn ExpiringStore>) -> Self {
        Self {
            store,
            ttl: CODE_TTL,
        }
    }

    #[cfg(test)]
    fn with_ttl(store: Arc<dyn ExpiringStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(email: &str) -> String {
        format!("code:{email}")
    }

    /// Generate and store a fresh code for `email`, returning it for
    /// delivery. Overwrites any previously issued code.
    pub async fn issue(&self, email: &str) -> Result<String, CacheError> {
        let code = generate_code();
        self.store.set(&Self::key(email), &code, self.ttl).await?;
        Ok(code)
    }

    /// Check a candidate code against the stored one.
    ///
    /// Returns `false` when no code is stored (expired or never issued) or
    /// when the candidate differs.
    pub async fn verify(&self, email: &str, candidate: &str) -> Result<bool, CacheError> {
        match self.store.get(&Self::key(email)).await? {
            Some(stored) => Ok(stored == candidate),
            None => Ok(false),
        }
    }

    /// Remove the stored code after successful consumption.
    pub async fn delete(&self, email: &str) -> Result<(), CacheError> {
        self.store.delete(&Self::key(email)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let codes = VerificationCodes::new(Arc::new(MemoryStore::new()));

        let code = codes.issue("a@b.com").await.unwrap();
        assert!(codes.verify("a@b.com", &code).await.unwrap());
        assert!(!codes.verify("a@b.com", "000000").await.unwrap() || code == "000000");
        assert!(!codes.verify("other@b.com", &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_code() {
        let codes = VerificationCodes::new(Arc::new(MemoryStore::new()));

        let first = codes.issue("a@b.com").await.unwrap();
        let second = codes.issue("a@b.com").await.unwrap();

        assert!(codes.verify("a@b.com", &second).await.unwrap());
        if first != second {
            assert!(!codes.verify("a@b.com", &first).await.unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_codes_expire_after_ttl() {
        let codes = VerificationCodes::with_ttl(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(180),
        );

        let code = codes.issue("a@b.com").await.unwrap();
        tokio::time::advance(Duration::from_secs(181)).await;
        assert!(!codes.verify("a@b.com", &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_consumes_code() {
        let codes = VerificationCodes::new(Arc::new(MemoryStore::new()));

        let code = codes.issue("a@b.com").await.unwrap();
        codes.delete("a@b.com").await.unwrap();
        assert!(!codes.verify("a@b.com", &code).await.unwrap());
    }
}
