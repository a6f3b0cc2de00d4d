//! Gatehouse application composition root
//!
//! Wires the account store, caches, token service, delivery pipeline, and
//! identity provider into a single application router.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tower_http::services::ServeDir;

use gatehouse_accounts::service::{AccountService, HttpAvatarMirror};
use gatehouse_accounts::{AccountsState, GoogleConfig, GoogleProvider, PgAccountStore};
use gatehouse_auth::{AuthConfig, TokenService};
use gatehouse_cache::{BindStaging, ExpiringStore, RedisStore, VerificationCodes};
use gatehouse_common::Config;
use gatehouse_email::{EmailConfig, EmailService, EmailServiceFactory, Mailer, MailerConfig};

const UPLOADS_DIR: &str = "uploads";

/// Create the main application router with all routes and middleware
pub async fn create_app(config: Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let store = Arc::new(PgAccountStore::new(pool));

    let cache: Arc<dyn ExpiringStore> = Arc::new(RedisStore::connect(&config.redis_url).await?);

    let tokens = TokenService::new(AuthConfig::from_env()?);

    // Email transport from environment, drained by the delivery pipeline
    let email_config = EmailConfig::from_env()?;
    let email_service: Arc<dyn EmailService> =
        Arc::from(EmailServiceFactory::create(email_config).await?);
    let mailer = Mailer::start(MailerConfig::from_env(), email_service);

    let provider = Arc::new(GoogleProvider::new(GoogleConfig::from_env()?)?);

    let avatars = Arc::new(HttpAvatarMirror::new(
        PathBuf::from(UPLOADS_DIR),
        config.public_url.clone(),
    )?);

    let service = AccountService::new(
        store,
        tokens,
        VerificationCodes::new(cache.clone()),
        BindStaging::new(cache),
        mailer,
        provider,
        avatars,
    );

    let accounts_state = AccountsState {
        service: Arc::new(service),
        production: config.is_production(),
        frontend_callback_url: config.frontend_callback_url.clone(),
    };

    // Build router — compose the domain router with shared infrastructure routes
    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest_service("/uploads", ServeDir::new(UPLOADS_DIR))
        .merge(gatehouse_accounts::routes().with_state(accounts_state));

    Ok(app)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
