//! Token minting and validation

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::{SessionClaims, TokenKind};
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Stateless token service.
///
/// Mints and validates the signed session claims for both token kinds. The
/// service holds no per-token state; cloning it is cheap and every handler
/// can own a copy.
#[derive(Debug, Clone)]
pub struct TokenService {
    config: AuthConfig,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Lifetime of refresh tokens in seconds, as used for cookie Max-Age.
    pub fn refresh_lifetime_secs(&self) -> i64 {
        self.config.refresh_ttl.as_secs() as i64
    }

    /// Mint a short-lived access token.
    pub fn issue_access(
        &self,
        user_id: Uuid,
        name: &str,
        role: &str,
    ) -> Result<String, AuthError> {
        self.issue(user_id, name, role, TokenKind::Access, self.config.access_ttl)
    }

    /// Mint a refresh token.
    ///
    /// Returns the signed token together with its lifetime in seconds so the
    /// caller can set the refresh cookie's Max-Age consistently with the
    /// token's own expiry.
    pub fn issue_refresh(
        &self,
        user_id: Uuid,
        name: &str,
        role: &str,
    ) -> Result<(String, i64), AuthError> {
        let token = self.issue(
            user_id,
            name,
            role,
            TokenKind::Refresh,
            self.config.refresh_ttl,
        )?;
        Ok((token, self.refresh_lifetime_secs()))
    }

    fn issue(
        &self,
        user_id: Uuid,
        name: &str,
        role: &str,
        kind: TokenKind,
        ttl: std::time::Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            kind,
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_ref()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, then check the token kind.
    ///
    /// Expiry is checked before the kind, so an expired refresh token fails
    /// with `Expired` rather than `InvalidTokenType`.
    pub fn validate(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.leeway = 0;

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "token validation failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::Malformed,
            }
        })?;

        if data.claims.kind != expected {
            return Err(AuthError::InvalidTokenType { expected });
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_service() -> TokenService {
        TokenService::new(AuthConfig {
            secret: "test-signing-secret".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(2_592_000),
        })
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue_access(user_id, "alice", "user").unwrap();
        let claims = service.validate(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_roundtrip_and_lifetime() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let (token, lifetime) = service.issue_refresh(user_id, "alice", "user").unwrap();
        // Configured 720h refresh lifetime maps to 2592000 seconds
        assert_eq!(lifetime, 2_592_000);

        let claims = service.validate(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 2_592_000);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let access = service.issue_access(user_id, "alice", "user").unwrap();
        let err = service.validate(&access, TokenKind::Refresh).unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidTokenType {
                expected: TokenKind::Refresh
            }
        ));

        let (refresh, _) = service.issue_refresh(user_id, "alice", "user").unwrap();
        let err = service.validate(&refresh, TokenKind::Access).unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidTokenType {
                expected: TokenKind::Access
            }
        ));
    }

    #[test]
    fn test_expired_token_fails_with_expiry_not_kind() {
        let service = test_service();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            name: "alice".to_string(),
            role: "user".to_string(),
            kind: TokenKind::Refresh,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test-signing-secret".as_ref()),
        )
        .unwrap();

        // Even validated as the wrong kind, expiry wins
        let err = service.validate(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        let err = service.validate(&token, TokenKind::Refresh).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = TokenService::new(AuthConfig {
            secret: "a-different-secret".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(2_592_000),
        });

        let token = other
            .issue_access(Uuid::new_v4(), "alice", "user")
            .unwrap();
        let err = service.validate(&token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::BadSignature));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        let err = service
            .validate("not-a-token", TokenKind::Access)
            .unwrap_err();
        assert!(matches!(err, AuthError::Malformed));
    }
}
