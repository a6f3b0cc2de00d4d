//! Password hashing

use bcrypt::DEFAULT_COST;

use crate::error::AccountError;

/// Hash a plaintext password with bcrypt at the default cost.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    bcrypt::hash(password, DEFAULT_COST)
        .map_err(|e| AccountError::Internal(format!("password hashing failed: {e}")))
}

/// Check a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error; the
/// caller treats both identically anyway.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        // Low cost keeps the test fast; production uses DEFAULT_COST
        let hash = bcrypt::hash("hunter22", 4).unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("hunter22", "not-a-bcrypt-hash"));
    }
}
