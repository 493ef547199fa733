//! Credential primitives: password hashing, the session token codec, and the
//! opaque API token generator.

pub mod api_token;
pub mod password;
pub mod session;

pub use session::{Claims, SessionCodec};
