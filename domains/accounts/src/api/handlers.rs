//! Accounts API handlers
//!
//! Implements the account endpoints:
//! - POST /v1/auth/code - Issue and deliver a verification code
//! - POST /v1/auth/register - Register with a verification code
//! - POST /v1/auth/login - Sign in with username/email + password
//! - POST /v1/auth/refresh - Rotate the session from the refresh cookie
//! - GET /v1/auth/username/{username} - Username availability
//! - GET /v1/auth/avatar - Avatar URL for the signed-in account
//! - GET /v1/oauth/google/url - Provider authorization URL + state cookie
//! - GET /v1/oauth/google/callback - Provider redirect target
//! - POST /v1/oauth/bind - Attach a staged identity to an account
//! - POST /v1/oauth/register - Register a fresh account from a staged identity

use axum::{
    extract::{Path, Query, State},
    http::{header::COOKIE, header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Json, Redirect, Response},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use url::Url;

use gatehouse_auth::{clear_refresh_cookie, refresh_cookie, REFRESH_COOKIE_NAME};
use gatehouse_common::validation::is_valid_email;

use crate::error::AccountError;
use crate::service::{CallbackOutcome, Session};

use super::AccountsState;

/// Request for issuing a verification code
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

/// Request for code-verified registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub code: String,
}

/// Request for password login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request for binding a staged identity to an existing account
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    pub bind_token: String,
    pub username: String,
    pub password: String,
}

/// Request for registering a fresh account from a staged identity
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRegisterRequest {
    pub bind_token: String,
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Query parameters on the provider callback redirect
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// POST /v1/auth/code
pub async fn send_code(
    State(state): State<AccountsState>,
    Json(request): Json<SendCodeRequest>,
) -> Result<Json<MessageResponse>, AccountError> {
    let email = request.email.trim();
    if !is_valid_email(email) {
        return Err(AccountError::Validation(
            "a valid email is required".to_string(),
        ));
    }

    state.service.send_code(email).await?;

    Ok(Json(MessageResponse {
        message: "verification code sent".to_string(),
    }))
}

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AccountsState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AccountError> {
    let username = request.username.trim();
    let email = request.email.trim();
    validate_username(username)?;
    validate_password(&request.password)?;
    if !is_valid_email(email) {
        return Err(AccountError::Validation(
            "a valid email is required".to_string(),
        ));
    }
    if request.code.len() != 6 || !request.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AccountError::Validation(
            "verification code must be 6 digits".to_string(),
        ));
    }

    state
        .service
        .register(username, email, &request.password, &request.code)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "account created".to_string(),
        }),
    ))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AccountsState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AccountError> {
    let identifier = request.username.trim();
    if identifier.is_empty() || request.password.is_empty() {
        return Err(AccountError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let session = state
        .service
        .login(identifier, &request.password, client_ip(&headers))
        .await?;

    Ok(session_response(&session, state.production))
}

/// GET /v1/auth/username/{username}
pub async fn check_username(
    State(state): State<AccountsState>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, AccountError> {
    let username = username.trim().to_string();
    validate_username(&username)?;

    if !state.service.username_available(&username).await? {
        return Err(AccountError::AccountExists);
    }

    Ok(Json(MessageResponse {
        message: "username is available".to_string(),
    }))
}

/// GET /v1/auth/avatar
pub async fn avatar(
    State(state): State<AccountsState>,
    headers: HeaderMap,
) -> Result<Json<AvatarResponse>, AccountError> {
    let token = bearer_token(&headers)
        .ok_or(AccountError::Token(gatehouse_auth::AuthError::Malformed))?;

    let avatar = state.service.avatar_url(token).await?;

    Ok(Json(AvatarResponse {
        avatar: avatar.unwrap_or_default(),
    }))
}

/// GET /v1/oauth/google/url
///
/// Returns the provider authorization URL for the frontend to navigate to.
/// The random state value also lands in a cookie, so the frontend can match
/// it against the `state` the provider echoes back on the callback.
pub async fn google_auth_url(State(state): State<AccountsState>) -> Result<Response, AccountError> {
    let mut raw = [0u8; STATE_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut raw);
    let oauth_state = hex::encode(raw);

    let url = state.service.authorization_url(&oauth_state)?;
    let cookie = oauth_state_cookie(&oauth_state, state.production);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AuthUrlResponse { url }),
    )
        .into_response())
}

/// GET /v1/oauth/google/callback
///
/// Always answers with a redirect to the frontend; errors travel as query
/// parameters rather than HTTP error responses because the caller here is a
/// browser mid-redirect, not an API client.
pub async fn google_callback(
    State(state): State<AccountsState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(%error, "provider callback returned an error");
        return error_redirect(&state.frontend_callback_url);
    }
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return error_redirect(&state.frontend_callback_url);
    };

    match state
        .service
        .provider_callback(&code, client_ip(&headers))
        .await
    {
        Ok(CallbackOutcome::SignedIn(session)) => {
            let url = redirect_url(
                &state.frontend_callback_url,
                &[("status", "success"), ("accessToken", &session.access_token)],
            );
            let cookie = refresh_cookie(
                &session.refresh_token,
                session.refresh_max_age,
                state.production,
            );
            (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(&url)).into_response()
        }
        Ok(CallbackOutcome::BindRequired {
            bind_token,
            email,
            avatar,
        }) => {
            let url = redirect_url(
                &state.frontend_callback_url,
                &[
                    ("status", "bind"),
                    ("bindToken", &bind_token),
                    ("email", &email),
                    ("avatar", &avatar),
                ],
            );
            Redirect::to(&url).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "provider callback failed");
            error_redirect(&state.frontend_callback_url)
        }
    }
}

/// POST /v1/oauth/bind
pub async fn bind(
    State(state): State<AccountsState>,
    headers: HeaderMap,
    Json(request): Json<BindRequest>,
) -> Result<Response, AccountError> {
    if request.bind_token.is_empty() {
        return Err(AccountError::Validation(
            "bind token is required".to_string(),
        ));
    }

    let session = state
        .service
        .bind(
            &request.bind_token,
            &request.username,
            &request.password,
            client_ip(&headers),
        )
        .await?;

    Ok(session_response(&session, state.production))
}

/// POST /v1/oauth/register
pub async fn register_with_bind(
    State(state): State<AccountsState>,
    headers: HeaderMap,
    Json(request): Json<BindRegisterRequest>,
) -> Result<Response, AccountError> {
    if request.bind_token.is_empty() {
        return Err(AccountError::Validation(
            "bind token is required".to_string(),
        ));
    }
    let username = request.username.trim();
    validate_username(username)?;
    validate_password(&request.password)?;
    if let Some(email) = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !is_valid_email(email) {
            return Err(AccountError::Validation(
                "a valid email is required".to_string(),
            ));
        }
    }

    let session = state
        .service
        .register_with_bind(
            &request.bind_token,
            username,
            &request.password,
            request.email.as_deref(),
            client_ip(&headers),
        )
        .await?;

    Ok(session_response(&session, state.production))
}

/// POST /v1/auth/refresh
///
/// Any invalid refresh token clears the cookie alongside the 401, so browsers
/// stop replaying a token that will never validate again.
pub async fn refresh(State(state): State<AccountsState>, headers: HeaderMap) -> Response {
    let Some(token) = refresh_cookie_value(&headers) else {
        return clear_and_reject(state.production);
    };

    match state.service.refresh(&token) {
        Ok(session) => session_response(&session, state.production),
        Err(e @ AccountError::Token(_)) => {
            let mut response = e.into_response();
            if let Ok(value) = clear_refresh_cookie(state.production).parse() {
                response.headers_mut().append(SET_COOKIE, value);
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

/// Cookie carrying the OAuth state between the URL request and the callback
const STATE_COOKIE_NAME: &str = "oauthstate";
const STATE_COOKIE_MAX_AGE: i64 = 3600;
const STATE_BYTES: usize = 16;

fn oauth_state_cookie(state: &str, production: bool) -> String {
    let attributes = if production {
        "Path=/; HttpOnly; Secure; SameSite=None"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    };
    format!("{STATE_COOKIE_NAME}={state}; Max-Age={STATE_COOKIE_MAX_AGE}; {attributes}")
}

fn validate_username(username: &str) -> Result<(), AccountError> {
    if username.len() < 3 || username.len() > 32 {
        return Err(AccountError::Validation(
            "username must be 3 to 32 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.len() < 6 {
        return Err(AccountError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

/// Build the standard signed-in response: refresh cookie + access token body.
fn session_response(session: &Session, production: bool) -> Response {
    let cookie = refresh_cookie(&session.refresh_token, session.refresh_max_age, production);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(TokenResponse {
            access_token: session.access_token.clone(),
        }),
    )
        .into_response()
}

fn clear_and_reject(production: bool) -> Response {
    let mut response =
        AccountError::Token(gatehouse_auth::AuthError::Malformed).into_response();
    if let Ok(value) = clear_refresh_cookie(production).parse() {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Bearer token from the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
}

/// First client IP from proxy headers, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
}

/// Extract the refresh token from the Cookie header.
fn refresh_cookie_value(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    let prefix = format!("{REFRESH_COOKIE_NAME}=");
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(prefix.as_str()))
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

fn redirect_url(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(base, params) {
        Ok(url) => url.into(),
        Err(e) => {
            tracing::error!(error = %e, %base, "invalid frontend callback URL");
            base.to_string()
        }
    }
}

fn error_redirect(base: &str) -> Response {
    Redirect::to(&redirect_url(base, &[("status", "error")])).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), Some("10.0.0.2".to_string()));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_refresh_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=tok123; lang=en"),
        );
        assert_eq!(refresh_cookie_value(&headers), Some("tok123".to_string()));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(refresh_cookie_value(&empty), None);
        assert_eq!(refresh_cookie_value(&HeaderMap::new()), None);
    }

    #[test]
    fn test_redirect_url_encodes_parameters() {
        let url = redirect_url(
            "http://localhost:5173/oauth/callback",
            &[("status", "bind"), ("email", "a+b@example.com")],
        );
        assert!(url.starts_with("http://localhost:5173/oauth/callback?"));
        assert!(url.contains("status=bind"));
        assert!(!url.contains("a+b@example.com"));
        assert!(url.contains("email=a%2Bb%40example.com"));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok123"),
        );
        assert_eq!(bearer_token(&headers), Some("tok123"));

        let mut basic = HeaderMap::new();
        basic.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(bearer_token(&basic), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_oauth_state_cookie_attributes() {
        let cookie = oauth_state_cookie("abc123", true);
        assert!(cookie.starts_with("oauthstate=abc123;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));

        let dev = oauth_state_cookie("abc123", false);
        assert!(dev.contains("SameSite=Lax"));
        assert!(!dev.contains("Secure"));
    }

    #[test]
    fn test_username_and_password_validation() {
        assert!(validate_username("al").is_err());
        assert!(validate_username("alice").is_ok());
        assert!(validate_username(&"x".repeat(33)).is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password("hunter22").is_ok());
    }
}
