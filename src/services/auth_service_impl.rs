//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::db::{Account, ApiToken, NewAccount, NewApiToken, Store};
use crate::security::{SessionCodec, password};
use crate::services::auth_service::{AuthError, AuthService, LoginOutcome, NewUser};

pub struct SeaOrmAuthService {
    store: Store,
    sessions: SessionCodec,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, sessions: SessionCodec) -> Self {
        Self { store, sessions }
    }

    /// Parses a stored RFC 3339 expiry. An unparseable timestamp is treated
    /// as already expired rather than as a server fault.
    fn is_expired(expires_at: &str) -> bool {
        DateTime::parse_from_rfc3339(expires_at)
            .map_or(true, |instant| instant.with_timezone(&Utc) <= Utc::now())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password_input: &str) -> Result<LoginOutcome, AuthError> {
        let Some((account, password_hash)) = self
            .store
            .get_user_by_username_with_password(username)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(password_input, &password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_active {
            return Err(AuthError::InactiveAccount);
        }

        let access_token = self
            .sessions
            .issue(&account.username, None)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(LoginOutcome {
            account,
            access_token,
        })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<Account, AuthError> {
        if self.store.get_user_by_email(&new_user.email).await?.is_some() {
            return Err(AuthError::Conflict(format!(
                "Email already registered: {}",
                new_user.email
            )));
        }

        if self
            .store
            .get_user_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict(format!(
                "Username already taken: {}",
                new_user.username
            )));
        }

        let account = self
            .store
            .insert_user(NewAccount {
                email: new_user.email,
                username: new_user.username,
                password_hash: password::hash_password(&new_user.password),
                is_admin: new_user.is_admin,
            })
            .await?;

        Ok(account)
    }

    async fn create_api_token(
        &self,
        user_id: i32,
        input: NewApiToken,
    ) -> Result<ApiToken, AuthError> {
        if input.name.trim().is_empty() {
            return Err(AuthError::Validation("Token name is required".to_string()));
        }

        if let Some(expires_at) = &input.expires_at
            && DateTime::parse_from_rfc3339(expires_at).is_err()
        {
            return Err(AuthError::Validation(format!(
                "expires_at is not a valid RFC 3339 timestamp: {expires_at}"
            )));
        }

        // Callers authenticate before reaching this point, so a missing
        // owner is a broken contract, not a user-facing failure.
        let owner = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("Owner account {user_id} not found")))?;

        let token = self.store.create_api_token(&owner, input).await?;

        Ok(token)
    }

    async fn list_api_tokens(&self, user_id: i32) -> Result<Vec<ApiToken>, AuthError> {
        let tokens = self.store.list_active_api_tokens(user_id).await?;
        Ok(tokens)
    }

    async fn revoke_api_token(&self, token_id: i32, user_id: i32) -> Result<bool, AuthError> {
        let revoked = self.store.revoke_api_token(token_id, user_id).await?;
        Ok(revoked)
    }

    async fn validate_api_token(
        &self,
        token_string: &str,
    ) -> Result<Option<Account>, AuthError> {
        let Some(token) = self.store.get_active_api_token(token_string).await? else {
            return Ok(None);
        };

        // Expiry gates validation without touching the stored active flag.
        if let Some(expires_at) = &token.expires_at
            && Self::is_expired(expires_at)
        {
            return Ok(None);
        }

        // Best-effort touch; a failed write must not fail the validation.
        if let Err(e) = self.store.touch_api_token(token.id).await {
            warn!("Failed to update last_used_at for token {}: {e}", token.id);
        }

        let owner = self.store.get_user_by_id(token.user_id).await?;
        Ok(owner)
    }

    async fn validate_session_token(&self, token: &str) -> Result<Option<Account>, AuthError> {
        let Some(claims) = self.sessions.verify(token) else {
            return Ok(None);
        };

        let account = self.store.get_user_by_username(&claims.sub).await?;
        Ok(account)
    }
}
