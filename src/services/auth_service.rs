//! Domain service for credential issuance and validation.
//!
//! Covers login, API token lifecycle (create, list, revoke), and dual-mode
//! validation of opaque API tokens and signed session tokens.

use thiserror::Error;

use crate::db::{Account, ApiToken, NewApiToken};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Inactive account")]
    InactiveAccount,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Successful login: the account plus a freshly signed session token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub access_token: String,
}

/// Input for account creation; the password arrives in plaintext and is
/// hashed by the service.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown username or
    /// wrong password, and [`AuthError::InactiveAccount`] when the password
    /// is correct but the account is deactivated.
    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the email or username is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<Account, AuthError>;

    /// Creates an opaque API token owned by `user_id`. The caller is
    /// expected to have authenticated already; a missing owner account is a
    /// contract violation surfaced as [`AuthError::Internal`].
    async fn create_api_token(
        &self,
        user_id: i32,
        input: NewApiToken,
    ) -> Result<ApiToken, AuthError>;

    /// Lists the active tokens owned by `user_id`.
    async fn list_api_tokens(&self, user_id: i32) -> Result<Vec<ApiToken>, AuthError>;

    /// Soft-deletes a token iff owned by `user_id`. Returns `false` without
    /// mutating when the token is missing, already revoked, or owned by a
    /// different account.
    async fn revoke_api_token(&self, token_id: i32, user_id: i32) -> Result<bool, AuthError>;

    /// Resolves an opaque API token to its owning account.
    ///
    /// Returns `Ok(None)` when the token is unknown, revoked, or past its
    /// expiry. Expiry is a view-time check: the stored `is_active` flag is
    /// never flipped here. A successful validation touches `last_used_at`.
    async fn validate_api_token(&self, token_string: &str)
        -> Result<Option<Account>, AuthError>;

    /// Resolves a signed session token to its account.
    ///
    /// Returns `Ok(None)` when the codec rejects the token, the subject
    /// claim is absent, or no account matches the subject. Deliberately does
    /// not re-check `is_active`: a session stays valid for its lifetime once
    /// issued, and only `login` gates on account state.
    async fn validate_session_token(&self, token: &str) -> Result<Option<Account>, AuthError>;
}
