//! Gatehouse session token service
//!
//! Implements the dual-token session model:
//! - Short-lived access tokens presented on API calls
//! - Longer-lived refresh tokens carried in a protected cookie and rotated
//!   on every refresh
//!
//! Tokens are self-contained HS256 JWTs; validity is purely a function of
//! signature and clock. There is no server-side token store or revocation
//! list. Compromise mitigation relies on the short access-token lifetime
//! plus refresh rotation.

pub mod claims;
pub mod config;
pub mod cookie;
pub mod error;
pub mod tokens;

pub use claims::{SessionClaims, TokenKind};
pub use config::AuthConfig;
pub use cookie::{clear_refresh_cookie, refresh_cookie, REFRESH_COOKIE_NAME};
pub use error::AuthError;
pub use tokens::TokenService;
