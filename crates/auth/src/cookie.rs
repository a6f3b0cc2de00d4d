//! Refresh-cookie contract
//!
//! The refresh token travels in an HttpOnly cookie. Browsers reject
//! `SameSite=None` without `Secure`, so non-production deployments (plain
//! HTTP) fall back to `SameSite=Lax` without `Secure`.

/// Cookie name carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Build the Set-Cookie value that installs a refresh token.
///
/// `max_age` is the refresh token's lifetime in seconds, keeping the cookie's
/// expiry consistent with the token's own.
pub fn refresh_cookie(token: &str, max_age: i64, production: bool) -> String {
    let attributes = if production {
        "Path=/; HttpOnly; Secure; SameSite=None"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    };
    format!("{REFRESH_COOKIE_NAME}={token}; Max-Age={max_age}; {attributes}")
}

/// Build the Set-Cookie value that clears the refresh cookie.
pub fn clear_refresh_cookie(production: bool) -> String {
    refresh_cookie("", 0, production)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_cookie_is_secure_same_site_none() {
        let cookie = refresh_cookie("tok123", 2_592_000, true);
        assert!(cookie.starts_with("refreshToken=tok123;"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_dev_cookie_relaxes_same_site() {
        let cookie = refresh_cookie("tok123", 900, false);
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_clear_cookie_zeroes_value_and_age() {
        let cookie = clear_refresh_cookie(true);
        assert!(cookie.starts_with("refreshToken=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
