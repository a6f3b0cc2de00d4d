//! External identity providers
//!
//! The [`IdentityProvider`] trait is the seam between account flows and the
//! provider's HTTP API; [`GoogleProvider`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AccountError;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_SCOPES: &str = "openid profile email";
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Tokens returned by the provider's code-exchange endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Profile fields shared by the provider's userinfo endpoint.
///
/// Everything except `sub` is optional on the wire; missing fields come back
/// as empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderProfile {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Stable provider name stored alongside linked accounts.
    fn name(&self) -> &'static str;

    /// Authorization URL to send the browser to, carrying the given state.
    fn authorize_url(&self, state: &str) -> Result<String, AccountError>;

    /// Exchange an authorization code for provider tokens.
    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, AccountError>;

    /// Fetch the profile behind an access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AccountError>;
}

/// Google OAuth client configuration
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl GoogleConfig {
    pub fn from_env() -> Result<Self, AccountError> {
        dotenvy::dotenv().ok();

        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| AccountError::Internal("GOOGLE_CLIENT_ID must be set".to_string()))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| AccountError::Internal("GOOGLE_CLIENT_SECRET must be set".to_string()))?;
        let redirect_url = std::env::var("GOOGLE_REDIRECT_URL")
            .map_err(|_| AccountError::Internal("GOOGLE_REDIRECT_URL must be set".to_string()))?;

        Ok(Self {
            client_id,
            client_secret,
            redirect_url,
        })
    }
}

/// Google OAuth identity provider
pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Result<Self, AccountError> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| AccountError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String, AccountError> {
        let url = url::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| AccountError::Internal(format!("failed to build authorization URL: {e}")))?;

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, AccountError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AccountError::Provider(format!("token exchange failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AccountError::Provider(format!(
                "token exchange returned {status}"
            )));
        }

        response
            .json::<ProviderTokens>()
            .await
            .map_err(|e| AccountError::Provider(format!("invalid token response: {e}")))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AccountError> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AccountError::Provider(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AccountError::Provider(format!(
                "userinfo returned {status}"
            )));
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|e| AccountError::Provider(format!("invalid userinfo response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_client_and_state() {
        let provider = GoogleProvider::new(GoogleConfig {
            client_id: "client-1".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:8080/v1/oauth/google/callback".to_string(),
        })
        .unwrap();

        let raw = provider.authorize_url("state-xyz").unwrap();
        let url = url::Url::parse(&raw).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(url.path(), "/o/oauth2/auth");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("client_id"), Some("client-1"));
        assert_eq!(
            get("redirect_uri"),
            Some("http://localhost:8080/v1/oauth/google/callback")
        );
        assert_eq!(get("scope"), Some("openid profile email"));
        assert_eq!(get("state"), Some("state-xyz"));
        assert_eq!(get("access_type"), Some("offline"));
    }

    #[test]
    fn test_profile_defaults_for_missing_fields() {
        let profile: ProviderProfile = serde_json::from_str(r#"{"sub":"abc123"}"#).unwrap();
        assert_eq!(profile.sub, "abc123");
        assert_eq!(profile.email, "");
        assert_eq!(profile.name, "");
        assert_eq!(profile.picture, "");
    }

    #[test]
    fn test_token_response_parses_google_shape() {
        let tokens: ProviderTokens = serde_json::from_str(
            r#"{"access_token":"ya29.x","expires_in":3599,"id_token":"eyJ...","scope":"openid","token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(tokens.access_token, "ya29.x");
        assert_eq!(tokens.id_token.as_deref(), Some("eyJ..."));
    }
}
