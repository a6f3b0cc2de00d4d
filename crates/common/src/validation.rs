//! Input validation helpers shared across Gatehouse crates

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[\w.+-]+@[\w.-]+\.[a-zA-Z]{2,}$").expect("email regex must compile");
}

/// Check that a string looks like an email address.
///
/// Intentionally permissive: the authoritative check is whether a
/// verification code can actually be delivered to the address.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 254 {
        return false;
    }
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@example.co.uk"));
        assert!(is_valid_email("user+tag@mail.example.com"));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@missing-local.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn test_rejects_overlong_addresses() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&long));
    }
}
