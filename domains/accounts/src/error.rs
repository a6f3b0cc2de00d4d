//! Accounts domain errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_common::envelope;

use gatehouse_auth::AuthError;
use gatehouse_cache::CacheError;

/// Errors produced by account flows.
///
/// Credential failures are deliberately uniform: an unknown identifier and a
/// wrong password both surface as [`AccountError::InvalidCredentials`], so the
/// response does not reveal which accounts exist.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username or email is already registered")]
    AccountExists,

    #[error("Verification code is invalid or has expired")]
    CodeInvalid,

    #[error("Email does not match the provider account")]
    EmailMismatch,

    #[error("Bind token is invalid or has expired")]
    InvalidBindToken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Token(#[from] AuthError),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        AccountError::Storage(err.to_string())
    }
}

impl From<CacheError> for AccountError {
    fn from(err: CacheError) -> Self {
        AccountError::Storage(err.to_string())
    }
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::AccountExists => StatusCode::CONFLICT,
            AccountError::CodeInvalid
            | AccountError::EmailMismatch
            | AccountError::InvalidBindToken
            | AccountError::Validation(_) => StatusCode::BAD_REQUEST,
            AccountError::Token(_) => StatusCode::UNAUTHORIZED,
            AccountError::Provider(_) | AccountError::Storage(_) | AccountError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AccountError::InvalidCredentials => "INVALID_CREDENTIALS",
            AccountError::AccountExists => "ACCOUNT_EXISTS",
            AccountError::CodeInvalid => "CODE_INVALID",
            AccountError::EmailMismatch => "EMAIL_MISMATCH",
            AccountError::InvalidBindToken => "INVALID_BIND_TOKEN",
            AccountError::Validation(_) => "VALIDATION_ERROR",
            AccountError::Token(_) => "INVALID_TOKEN",
            AccountError::Provider(_) => "PROVIDER_ERROR",
            AccountError::Storage(_) => "STORAGE_ERROR",
            AccountError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        // Token errors carry their own status/body mapping
        if let AccountError::Token(inner) = self {
            return inner.into_response();
        }

        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "account operation failed");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        envelope(status, self.error_code(), &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AccountError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AccountError::AccountExists.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AccountError::CodeInvalid.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AccountError::EmailMismatch.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AccountError::Storage("db down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_errors_delegate_to_auth_mapping() {
        let response = AccountError::Token(AuthError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_server_errors_stay_opaque() {
        let response =
            AccountError::Storage("connection refused at 10.0.0.3:5432".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
