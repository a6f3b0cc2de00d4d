//! Account store implementations

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Account, NewAccount, Profile};
use crate::error::AccountError;

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

/// Persistence seam for accounts and profiles.
///
/// `create_with_profile` is the only multi-row write and must be atomic:
/// either both the account and its profile land, or neither does.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    async fn find_by_provider(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<Account>, AccountError>;

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AccountError>;

    /// Create the account and its profile row in one transaction.
    async fn create_with_profile(
        &self,
        account: NewAccount,
        nickname: &str,
        avatar_url: Option<String>,
    ) -> Result<Account, AccountError>;

    /// Attach an external identity to an existing account.
    async fn link_provider(
        &self,
        user_id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<(), AccountError>;

    /// Record login telemetry: timestamp, client IP, and a counter bump.
    async fn record_login(&self, user_id: Uuid, ip: Option<String>) -> Result<(), AccountError>;

    async fn update_avatar(&self, user_id: Uuid, avatar_url: &str) -> Result<(), AccountError>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AccountError>;
}
