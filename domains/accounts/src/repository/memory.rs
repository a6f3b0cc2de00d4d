//! In-memory account store
//!
//! Backs service tests and local development without a database. Mirrors the
//! PostgreSQL store's semantics, including the atomic account+profile create.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{Account, NewAccount, Profile};
use crate::error::AccountError;

use super::AccountStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: Arc<Mutex<Vec<Account>>>,
    profiles: Arc<Mutex<HashMap<Uuid, Profile>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a snapshot of an account by id.
    pub fn get(&self, user_id: Uuid) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == user_id)
            .cloned()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<Account>, AccountError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| {
                a.provider.as_deref() == Some(provider)
                    && a.provider_id.as_deref() == Some(provider_id)
            })
            .cloned())
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AccountError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.username == username || a.email.as_deref() == Some(email)))
    }

    async fn create_with_profile(
        &self,
        account: NewAccount,
        nickname: &str,
        avatar_url: Option<String>,
    ) -> Result<Account, AccountError> {
        let created = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            status: "active".to_string(),
            provider: account.provider,
            provider_id: account.provider_id,
            login_count: 0,
            last_login_at: None,
            last_login_ip: None,
            created_at: Utc::now(),
        };

        let profile = Profile {
            user_id: created.id,
            nickname: Some(nickname.to_string()),
            avatar_url,
        };

        // Both locks held together so the write is all-or-nothing
        let mut accounts = self.accounts.lock().unwrap();
        let mut profiles = self.profiles.lock().unwrap();
        accounts.push(created.clone());
        profiles.insert(created.id, profile);

        Ok(created)
    }

    async fn link_provider(
        &self,
        user_id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<(), AccountError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == user_id) {
            account.provider = Some(provider.to_string());
            account.provider_id = Some(provider_id.to_string());
        }
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, ip: Option<String>) -> Result<(), AccountError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == user_id) {
            account.last_login_at = Some(Utc::now());
            account.last_login_ip = ip;
            account.login_count += 1;
        }
        Ok(())
    }

    async fn update_avatar(&self, user_id: Uuid, avatar_url: &str) -> Result<(), AccountError> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.get_mut(&user_id) {
            profile.avatar_url = Some(avatar_url.to_string());
        }
        Ok(())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AccountError> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = InMemoryAccountStore::new();
        let created = store
            .create_with_profile(
                NewAccount::local(
                    "alice".to_string(),
                    "alice@example.com".to_string(),
                    "hash".to_string(),
                ),
                "alice",
                None,
            )
            .await
            .unwrap();

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_email = store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);

        let profile = store.find_profile(created.id).await.unwrap().unwrap();
        assert_eq!(profile.nickname.as_deref(), Some("alice"));

        assert!(store
            .username_or_email_exists("alice", "nobody@example.com")
            .await
            .unwrap());
        assert!(!store
            .username_or_email_exists("bob", "nobody@example.com")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_record_login_bumps_telemetry() {
        let store = InMemoryAccountStore::new();
        let created = store
            .create_with_profile(
                NewAccount::local(
                    "alice".to_string(),
                    "alice@example.com".to_string(),
                    "hash".to_string(),
                ),
                "alice",
                None,
            )
            .await
            .unwrap();

        store
            .record_login(created.id, Some("10.1.2.3".to_string()))
            .await
            .unwrap();

        let account = store.get(created.id).unwrap();
        assert_eq!(account.login_count, 1);
        assert_eq!(account.last_login_ip.as_deref(), Some("10.1.2.3"));
        assert!(account.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_link_provider() {
        let store = InMemoryAccountStore::new();
        let created = store
            .create_with_profile(
                NewAccount::local(
                    "alice".to_string(),
                    "alice@example.com".to_string(),
                    "hash".to_string(),
                ),
                "alice",
                None,
            )
            .await
            .unwrap();

        store
            .link_provider(created.id, "google", "sub-123")
            .await
            .unwrap();

        let linked = store
            .find_by_provider("google", "sub-123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(linked.id, created.id);
        assert!(linked.has_provider_link());
    }
}
