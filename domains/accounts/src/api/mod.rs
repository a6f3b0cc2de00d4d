//! API layer for the Accounts domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::service::AccountService;

pub use routes::routes;

/// Shared state for Accounts domain handlers
#[derive(Clone)]
pub struct AccountsState {
    pub service: Arc<AccountService>,
    /// Controls the refresh cookie's Secure/SameSite attributes
    pub production: bool,
    /// Frontend URL that provider callbacks redirect back to
    pub frontend_callback_url: String,
}
