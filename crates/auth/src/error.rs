//! Token service errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_common::envelope;

/// Token issuance and validation errors.
///
/// All validation failures collapse to a generic "invalid or expired" message
/// at the HTTP boundary; the distinction only matters to callers inside the
/// process (the refresh flow clears the cookie on any of them).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("invalid token type: expected {expected}")]
    InvalidTokenType { expected: crate::TokenKind },

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("auth configuration error: {0}")]
    Configuration(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::Expired
            | AuthError::Malformed
            | AuthError::BadSignature
            | AuthError::InvalidTokenType { .. } => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or expired token",
            ),
            AuthError::Signing(_) | AuthError::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_ERROR",
                "Authentication failed",
            ),
        };

        envelope(status, code, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenKind;

    #[test]
    fn test_validation_errors_map_to_unauthorized() {
        for error in [
            AuthError::Expired,
            AuthError::Malformed,
            AuthError::BadSignature,
            AuthError::InvalidTokenType {
                expected: TokenKind::Refresh,
            },
        ] {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_signing_errors_map_to_server_error() {
        let response = AuthError::Signing("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
