//! Route definitions for Accounts domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AccountsState;

/// Create auth routes: codes, registration, login, refresh
fn auth_routes() -> Router<AccountsState> {
    Router::new()
        .route("/v1/auth/code", post(handlers::send_code))
        .route("/v1/auth/register", post(handlers::register))
        .route("/v1/auth/login", post(handlers::login))
        .route("/v1/auth/refresh", post(handlers::refresh))
        .route("/v1/auth/username/{username}", get(handlers::check_username))
        .route("/v1/auth/avatar", get(handlers::avatar))
}

/// Create OAuth routes: provider entry URL, callback, bind, bind-registration
fn oauth_routes() -> Router<AccountsState> {
    Router::new()
        .route("/v1/oauth/google/url", get(handlers::google_auth_url))
        .route("/v1/oauth/google/callback", get(handlers::google_callback))
        .route("/v1/oauth/bind", post(handlers::bind))
        .route("/v1/oauth/register", post(handlers::register_with_bind))
}

/// Create all Accounts domain routes
pub fn routes() -> Router<AccountsState> {
    auth_routes().merge(oauth_routes())
}
