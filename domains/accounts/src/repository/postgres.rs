//! PostgreSQL account store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Account, NewAccount, Profile};
use crate::error::AccountError;

use super::AccountStore;

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, status, \
     provider, provider_id, login_count, last_login_at, last_login_ip, created_at";

/// Account store backed by PostgreSQL
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<Account>, AccountError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE provider = $1 AND provider_id = $2"
        ))
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AccountError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE username = $1 OR email = $2",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn create_with_profile(
        &self,
        account: NewAccount,
        nickname: &str,
        avatar_url: Option<String>,
    ) -> Result<Account, AccountError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts \
                (id, username, email, password_hash, role, status, provider, provider_id, \
                 login_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, 0, NOW()) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.role)
        .bind(&account.provider)
        .bind(&account.provider_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (user_id, nickname, avatar_url) VALUES ($1, $2, $3)")
            .bind(created.id)
            .bind(nickname)
            .bind(&avatar_url)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn link_provider(
        &self,
        user_id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<(), AccountError> {
        sqlx::query("UPDATE accounts SET provider = $2, provider_id = $3 WHERE id = $1")
            .bind(user_id)
            .bind(provider)
            .bind(provider_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, ip: Option<String>) -> Result<(), AccountError> {
        sqlx::query(
            "UPDATE accounts \
             SET last_login_at = NOW(), last_login_ip = $2, login_count = login_count + 1 \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(&ip)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_avatar(&self, user_id: Uuid, avatar_url: &str) -> Result<(), AccountError> {
        sqlx::query("UPDATE profiles SET avatar_url = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(avatar_url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AccountError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, nickname, avatar_url FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
