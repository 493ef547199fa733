//! Password hashing for the account store.
//!
//! Uses an unsalted SHA-256 hex digest. This is the scheme already present in
//! the deployed store, so new hashes must stay byte-compatible with existing
//! records. It is deliberately deterministic and provides no per-record salt;
//! do not reuse it outside this service.

use sha2::{Digest, Sha256};

/// Hashes a password to a lowercase hex SHA-256 digest.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());

    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Verifies a password against a stored digest.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn test_distinct_passwords_hash_differently() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter3"));
    }

    #[test]
    fn test_known_digest() {
        // SHA-256 of the empty string, a fixed vector.
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_round_trip() {
        let hash = hash_password("correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }
}
