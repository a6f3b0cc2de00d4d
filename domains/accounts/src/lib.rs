//! Accounts domain: registration, login, OAuth binding, session tokens

pub mod api;
pub mod domain;
pub mod error;
pub mod oauth;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Account, NewAccount, Profile};
pub use error::AccountError;
pub use oauth::{GoogleConfig, GoogleProvider, IdentityProvider, ProviderProfile, ProviderTokens};
pub use repository::{AccountStore, InMemoryAccountStore, PgAccountStore};
pub use service::{AccountService, CallbackOutcome, Session};

// Re-export API types
pub use api::routes;
pub use api::AccountsState;
