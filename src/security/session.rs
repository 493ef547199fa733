//! Signed session token codec.
//!
//! Sessions are stateless JWTs: a subject claim plus an absolute expiry,
//! signed with a shared symmetric secret. There is no server-side session
//! store, so validity is purely a function of signature and expiry.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::JwtConfig;

/// Claims carried by a session token. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account's username.
    pub sub: String,

    /// Expiry as Unix seconds.
    pub exp: usize,
}

/// Immutable codec built once at startup from [`JwtConfig`].
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl SessionCodec {
    pub fn new(config: &JwtConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .with_context(|| format!("Unsupported JWT algorithm: {}", config.algorithm))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            default_ttl: Duration::minutes(i64::from(config.access_token_ttl_minutes)),
        })
    }

    /// Issues a signed token for `subject`, expiring after `ttl` (or the
    /// configured default when `None`).
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl.unwrap_or(self.default_ttl))
            .context("Session expiry overflows the representable time range")?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: usize::try_from(expires_at.timestamp()).unwrap_or(0),
        };

        encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )
        .context("Failed to sign session token")
    }

    /// Decodes and checks a token, returning its claims only when the
    /// signature is valid and the expiry is still in the future.
    ///
    /// Returns `None` uniformly for malformed, tampered, and expired tokens;
    /// callers never learn which check failed.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is exact: a token one second past `exp` is already invalid.
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> SessionCodec {
        SessionCodec::new(&JwtConfig {
            secret: "test-secret-key-12345".to_string(),
            algorithm: "HS256".to_string(),
            access_token_ttl_minutes: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_subject() {
        let codec = test_codec();
        let token = codec.issue("alice", None).unwrap();

        let claims = codec.verify(&token).expect("fresh token should verify");
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > usize::try_from(Utc::now().timestamp()).unwrap());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = test_codec();
        let token = codec.issue("alice", Some(Duration::seconds(-1))).unwrap();

        assert!(codec.verify(&token).is_none());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = test_codec();
        let token = codec.issue("alice", None).unwrap();

        // Flip one character in the signature segment.
        let mut chars: Vec<char> = token.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
        let tampered: String = chars.into_iter().collect();

        assert!(codec.verify(&tampered).is_none());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = test_codec();
        assert!(codec.verify("not.a.jwt").is_none());
        assert!(codec.verify("").is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = test_codec();
        let other = SessionCodec::new(&JwtConfig {
            secret: "a-different-secret".to_string(),
            algorithm: "HS256".to_string(),
            access_token_ttl_minutes: 30,
        })
        .unwrap();

        let token = codec.issue("alice", None).unwrap();
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result = SessionCodec::new(&JwtConfig {
            secret: "secret".to_string(),
            algorithm: "none".to_string(),
            access_token_ttl_minutes: 30,
        });
        assert!(result.is_err());
    }
}
