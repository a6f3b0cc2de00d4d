//! Account flow orchestration
//!
//! `AccountService` ties the stores, the token service, the delivery
//! pipeline, and the identity provider together into the account flows:
//! verification codes, registration, login, OAuth callback/bind, refresh.
//!
//! Failure policy at a glance:
//! - Credential failures are uniform (`InvalidCredentials`), regardless of
//!   whether the identifier or the password was wrong.
//! - Login telemetry and profile backfill are fire-and-forget; their
//!   failures are logged and never affect the response.
//! - Email delivery degrades from queued to inline best-effort; a stored
//!   code with a lost email still counts as success.

pub mod avatar;
pub mod password;

use std::sync::Arc;

use uuid::Uuid;

use gatehouse_auth::{AuthError, TokenKind, TokenService};
use gatehouse_cache::{BindStaging, StagedIdentity, VerificationCodes};
use gatehouse_common::validation::is_valid_email;
use gatehouse_email::Mailer;

use crate::domain::entities::{Account, NewAccount};
use crate::error::AccountError;
use crate::oauth::{IdentityProvider, ProviderProfile};
use crate::repository::AccountStore;

pub use avatar::{AvatarMirror, HttpAvatarMirror};

/// A freshly minted token pair for a signed-in account.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Refresh-token lifetime in seconds, for the cookie Max-Age.
    pub refresh_max_age: i64,
}

/// Result of a provider callback: either a session for a known identity, or
/// a staged bind token for an unknown one.
#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    SignedIn(Session),
    BindRequired {
        bind_token: String,
        email: String,
        avatar: String,
    },
}

/// Orchestrates the account flows.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    tokens: TokenService,
    codes: VerificationCodes,
    staging: BindStaging,
    mailer: Mailer,
    provider: Arc<dyn IdentityProvider>,
    avatars: Arc<dyn AvatarMirror>,
}

impl AccountService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn AccountStore>,
        tokens: TokenService,
        codes: VerificationCodes,
        staging: BindStaging,
        mailer: Mailer,
        provider: Arc<dyn IdentityProvider>,
        avatars: Arc<dyn AvatarMirror>,
    ) -> Self {
        Self {
            store,
            tokens,
            codes,
            staging,
            mailer,
            provider,
            avatars,
        }
    }

    /// Issue a verification code and hand it to the delivery pipeline.
    ///
    /// The code is stored before delivery is attempted, so a lost email can
    /// be remedied by requesting a new code. A saturated queue degrades to an
    /// inline best-effort send whose failure is only logged.
    pub async fn send_code(&self, email: &str) -> Result<(), AccountError> {
        let code = self.codes.issue(email).await?;

        if !self.mailer.enqueue(email, &code).await {
            tracing::warn!(recipient = %email, "delivery queue saturated, sending inline");
            if let Err(e) = self.mailer.send_now(email, &code).await {
                tracing::error!(
                    error = %e,
                    recipient = %email,
                    "inline verification email send failed"
                );
            }
        }

        Ok(())
    }

    /// Whether a username is still free to register.
    pub async fn username_available(&self, username: &str) -> Result<bool, AccountError> {
        Ok(self.store.find_by_username(username).await?.is_none())
    }

    /// Register a new account through the email-verification flow.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<(), AccountError> {
        if !self.codes.verify(email, code).await? {
            return Err(AccountError::CodeInvalid);
        }

        if self.store.username_or_email_exists(username, email).await? {
            return Err(AccountError::AccountExists);
        }

        let password_hash = password::hash_password(password)?;
        self.store
            .create_with_profile(
                NewAccount::local(username.to_string(), email.to_string(), password_hash),
                username,
                None,
            )
            .await?;

        // The account exists either way; a leftover code only expires sooner
        if let Err(e) = self.codes.delete(email).await {
            tracing::warn!(error = %e, "failed to delete consumed verification code");
        }

        Ok(())
    }

    /// Sign in with a username or email plus password.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<Session, AccountError> {
        let account = if is_valid_email(identifier) {
            self.store.find_by_email(identifier).await?
        } else {
            self.store.find_by_username(identifier).await?
        };

        let Some(account) = account else {
            return Err(AccountError::InvalidCredentials);
        };
        if !password::verify_password(password, &account.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let session = self.issue_session(&account)?;
        self.spawn_record_login(account.id, ip);
        Ok(session)
    }

    /// Provider authorization URL carrying the given state value.
    pub fn authorization_url(&self, state: &str) -> Result<String, AccountError> {
        self.provider.authorize_url(state)
    }

    /// Handle the provider redirect: exchange the authorization code, look
    /// the identity up, and either sign in or stage a bind.
    pub async fn provider_callback(
        &self,
        code: &str,
        ip: Option<String>,
    ) -> Result<CallbackOutcome, AccountError> {
        let tokens = self.provider.exchange_code(code).await?;
        let profile = self.provider.fetch_profile(&tokens.access_token).await?;

        match self
            .store
            .find_by_provider(self.provider.name(), &profile.sub)
            .await?
        {
            Some(account) => {
                let session = self.issue_session(&account)?;
                self.spawn_record_login(account.id, ip);
                self.spawn_profile_backfill(account, profile);
                Ok(CallbackOutcome::SignedIn(session))
            }
            None => {
                let staged = StagedIdentity {
                    provider: self.provider.name().to_string(),
                    provider_id: profile.sub,
                    email: profile.email,
                    name: profile.name,
                    avatar: profile.picture,
                    id_token: tokens.id_token.unwrap_or_default(),
                    access_token: tokens.access_token,
                };
                let bind_token = self.staging.stage(&staged).await?;
                Ok(CallbackOutcome::BindRequired {
                    bind_token,
                    email: staged.email,
                    avatar: staged.avatar,
                })
            }
        }
    }

    /// Attach a staged external identity to an existing account, verified by
    /// that account's own credentials.
    pub async fn bind(
        &self,
        bind_token: &str,
        identifier: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<Session, AccountError> {
        let staged = self
            .staging
            .consume(bind_token)
            .await?
            .ok_or(AccountError::InvalidBindToken)?;

        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AccountError::Validation(
                "username or email is required".to_string(),
            ));
        }

        let account = if is_valid_email(identifier) {
            self.store.find_by_email(identifier).await?
        } else {
            self.store.find_by_username(identifier).await?
        };
        let Some(account) = account else {
            return Err(AccountError::InvalidCredentials);
        };
        if !password::verify_password(password, &account.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        self.store
            .link_provider(account.id, &staged.provider, &staged.provider_id)
            .await?;

        let session = self.issue_session(&account)?;
        self.spawn_record_login(account.id, ip);
        Ok(session)
    }

    /// Create a fresh account already linked to a staged external identity.
    ///
    /// When the caller supplies an email and the provider shared one, the two
    /// must agree; a missing caller email adopts the provider's.
    pub async fn register_with_bind(
        &self,
        bind_token: &str,
        username: &str,
        password: &str,
        email: Option<&str>,
        ip: Option<String>,
    ) -> Result<Session, AccountError> {
        let staged = self
            .staging
            .consume(bind_token)
            .await?
            .ok_or(AccountError::InvalidBindToken)?;

        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) if !staged.email.is_empty() && e != staged.email => {
                return Err(AccountError::EmailMismatch)
            }
            Some(e) => Some(e.to_string()),
            None if !staged.email.is_empty() => Some(staged.email.clone()),
            None => None,
        };

        if self
            .store
            .username_or_email_exists(username, email.as_deref().unwrap_or(""))
            .await?
        {
            return Err(AccountError::AccountExists);
        }

        let password_hash = password::hash_password(password)?;

        let account = self
            .store
            .create_with_profile(
                NewAccount::with_provider(
                    username.to_string(),
                    email,
                    password_hash,
                    staged.provider,
                    staged.provider_id,
                ),
                username,
                None,
            )
            .await?;

        // Mirror only once the account exists, so a failed create leaves no
        // orphaned file behind; a failed fetch just leaves the profile bare.
        if !staged.avatar.is_empty() {
            if let Some(url) = self.avatars.mirror(&staged.avatar, username).await {
                if let Err(e) = self.store.update_avatar(account.id, &url).await {
                    tracing::warn!(
                        error = %e,
                        user_id = %account.id,
                        "failed to store mirrored avatar"
                    );
                }
            }
        }

        let session = self.issue_session(&account)?;
        self.spawn_record_login(account.id, ip);
        Ok(session)
    }

    /// Mint a new token pair from a valid refresh token.
    ///
    /// Stateless rotation: claims are carried over from the presented token,
    /// no store lookup happens, and the old refresh token stays valid until
    /// its own expiry.
    pub fn refresh(&self, refresh_token: &str) -> Result<Session, AccountError> {
        let claims = self.tokens.validate(refresh_token, TokenKind::Refresh)?;
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AccountError::Token(AuthError::Malformed))?;

        let access_token = self
            .tokens
            .issue_access(user_id, &claims.name, &claims.role)?;
        let (refresh_token, refresh_max_age) = self
            .tokens
            .issue_refresh(user_id, &claims.name, &claims.role)?;

        Ok(Session {
            user_id,
            username: claims.name,
            access_token,
            refresh_token,
            refresh_max_age,
        })
    }

    /// Avatar URL for the account behind a valid access token, if the
    /// profile carries one.
    pub async fn avatar_url(&self, access_token: &str) -> Result<Option<String>, AccountError> {
        let claims = self.tokens.validate(access_token, TokenKind::Access)?;
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AccountError::Token(AuthError::Malformed))?;

        Ok(self
            .store
            .find_profile(user_id)
            .await?
            .and_then(|p| p.avatar_url))
    }

    fn issue_session(&self, account: &Account) -> Result<Session, AccountError> {
        let access_token = self
            .tokens
            .issue_access(account.id, &account.username, &account.role)?;
        let (refresh_token, refresh_max_age) = self
            .tokens
            .issue_refresh(account.id, &account.username, &account.role)?;

        Ok(Session {
            user_id: account.id,
            username: account.username.clone(),
            access_token,
            refresh_token,
            refresh_max_age,
        })
    }

    fn spawn_record_login(&self, user_id: Uuid, ip: Option<String>) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record_login(user_id, ip).await {
                tracing::warn!(error = %e, %user_id, "failed to record login telemetry");
            }
        });
    }

    /// Backfill provider columns and refresh the stored avatar after a
    /// provider sign-in. Best-effort, off the request path.
    fn spawn_profile_backfill(&self, account: Account, profile: ProviderProfile) {
        let store = self.store.clone();
        let provider = self.provider.name();
        tokio::spawn(async move {
            if !account.has_provider_link() {
                if let Err(e) = store.link_provider(account.id, provider, &profile.sub).await {
                    tracing::warn!(error = %e, user_id = %account.id, "provider backfill failed");
                }
            }

            if profile.picture.is_empty() {
                return;
            }
            match store.find_profile(account.id).await {
                Ok(Some(p)) if p.avatar_url.as_deref() != Some(profile.picture.as_str()) => {
                    if let Err(e) = store.update_avatar(account.id, &profile.picture).await {
                        tracing::warn!(error = %e, user_id = %account.id, "avatar refresh failed");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %account.id, "avatar refresh lookup failed");
                }
            }
        });
    }
}
