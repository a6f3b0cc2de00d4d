//! Token service configuration

use std::time::Duration;

/// Fallback access-token lifetime when the configured value is missing or
/// unparseable.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Fallback refresh-token lifetime (30 days).
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration for minting and validating session tokens
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub secret: String,
    /// Access-token lifetime
    pub access_ttl: Duration,
    /// Refresh-token lifetime (also drives the refresh cookie Max-Age)
    pub refresh_ttl: Duration,
}

impl AuthConfig {
    /// Load from environment: `JWT_SECRET` (required), `JWT_ACCESS_EXPIRE`
    /// and `JWT_REFRESH_EXPIRE` (duration strings such as `15m` or `720h`,
    /// defaulted when absent or unparseable).
    pub fn from_env() -> Result<Self, crate::AuthError> {
        dotenvy::dotenv().ok();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| crate::AuthError::Configuration("JWT_SECRET is required".to_string()))?;

        let access_ttl = std::env::var("JWT_ACCESS_EXPIRE")
            .ok()
            .and_then(|v| parse_duration(&v))
            .unwrap_or(DEFAULT_ACCESS_TTL);

        let refresh_ttl = std::env::var("JWT_REFRESH_EXPIRE")
            .ok()
            .and_then(|v| parse_duration(&v))
            .unwrap_or(DEFAULT_REFRESH_TTL);

        Ok(Self {
            secret,
            access_ttl,
            refresh_ttl,
        })
    }
}

/// Parse a duration string with an `s`, `m`, `h`, or `d` suffix.
///
/// Returns `None` on anything unparseable or non-positive so callers fall
/// back to the documented defaults.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit) = value.split_at(value.len().checked_sub(1)?);
    let amount: u64 = digits.parse().ok()?;
    if amount == 0 {
        return None;
    }
    let secs = match unit {
        "s" => amount,
        "m" => amount * 60,
        "h" => amount * 60 * 60,
        "d" => amount * 24 * 60 * 60,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("15m"), Some(Duration::from_secs(900)));
        assert_eq!(parse_duration("720h"), Some(Duration::from_secs(2_592_000)));
        assert_eq!(parse_duration("30d"), Some(Duration::from_secs(2_592_000)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("15"), None);
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("fifteen minutes"), None);
        assert_eq!(parse_duration("15w"), None);
    }
}
