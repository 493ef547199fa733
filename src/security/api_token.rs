//! Opaque API token generation.
//!
//! Token strings follow the fixed format `user:<username>:<hex12>`. The
//! prefix is a stable external contract: downstream systems pattern-match on
//! it to tell API tokens apart from session JWTs. Do not change it.

use rand::Rng;

/// Prefix shared by every opaque API token.
pub const TOKEN_PREFIX: &str = "user:";

/// Number of random hex characters in the suffix (48 bits of entropy).
const SUFFIX_HEX_CHARS: usize = 12;

/// Generates a fresh opaque token string for `username`.
///
/// The suffix comes from the thread-local CSPRNG. Uniqueness is enforced by
/// the store's unique index, not here; insertion retries with a fresh suffix
/// on collision.
#[must_use]
pub fn generate(username: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SUFFIX_HEX_CHARS / 2] = rng.random();

    let suffix = bytes.iter().fold(
        String::with_capacity(SUFFIX_HEX_CHARS),
        |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        },
    );

    format!("{TOKEN_PREFIX}{username}:{suffix}")
}
