//! Session claim types

use serde::{Deserialize, Serialize};

/// Distinguishes access tokens from refresh tokens.
///
/// The kind is embedded in the signed claims and checked on validation so an
/// access token cannot be presented where a refresh token is required, and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Signed session claims, immutable once minted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Role
    pub role: String,
    /// Token kind (access or refresh)
    pub kind: TokenKind,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"refresh\"");
    }

    #[test]
    fn test_claims_roundtrip() {
        let claims = SessionClaims {
            sub: "42".to_string(),
            name: "alice".to_string(),
            role: "user".to_string(),
            kind: TokenKind::Refresh,
            iat: 1_700_000_000,
            exp: 1_700_000_900,
        };
        let json = serde_json::to_string(&claims).unwrap();
        let back: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, "42");
        assert_eq!(back.kind, TokenKind::Refresh);
    }
}
