//! Account and profile entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered account.
///
/// `email` is optional: provider-bound registrations may omit it when the
/// provider did not share one. `provider`/`provider_id` are set once the
/// account is linked to an external identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub login_count: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Whether this account is already linked to an external identity.
    pub fn has_provider_link(&self) -> bool {
        self.provider.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Per-account profile row, created atomically with the account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

/// Data required to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

impl NewAccount {
    /// Account created through the email-verification flow.
    pub fn local(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email: Some(email),
            password_hash,
            role: "user".to_string(),
            provider: None,
            provider_id: None,
        }
    }

    /// Account created through a provider bind-registration flow.
    pub fn with_provider(
        username: String,
        email: Option<String>,
        password_hash: String,
        provider: String,
        provider_id: String,
    ) -> Self {
        Self {
            username,
            email,
            password_hash,
            role: "user".to_string(),
            provider: Some(provider),
            provider_id: Some(provider_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_link_detection() {
        let mut account = Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            password_hash: "hash".to_string(),
            role: "user".to_string(),
            status: "active".to_string(),
            provider: None,
            provider_id: None,
            login_count: 0,
            last_login_at: None,
            last_login_ip: None,
            created_at: Utc::now(),
        };
        assert!(!account.has_provider_link());

        account.provider = Some(String::new());
        assert!(!account.has_provider_link());

        account.provider = Some("google".to_string());
        assert!(account.has_provider_link());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let account = Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: None,
            password_hash: "$2b$12$secret".to_string(),
            role: "user".to_string(),
            status: "active".to_string(),
            provider: None,
            provider_id: None,
            login_count: 0,
            last_login_at: None,
            last_login_ip: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password_hash"));
    }
}
