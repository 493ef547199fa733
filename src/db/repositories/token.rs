use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use tracing::warn;

use crate::entities::api_tokens;
use crate::security::api_token;

use super::user::Account;

/// Bounded retries when a freshly generated token string collides with an
/// existing row. 48 bits of suffix entropy makes this vanishingly rare, but
/// the unique index is the authority.
const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// Input for API token creation.
#[derive(Debug, Clone)]
pub struct NewApiToken {
    pub name: String,
    pub description: Option<String>,
    pub expires_at: Option<String>,
}

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates a token owned by `owner`. The opaque string embeds the
    /// owner's username, so the owner must be resolved before generation.
    pub async fn create(
        &self,
        owner: &Account,
        input: NewApiToken,
    ) -> Result<api_tokens::Model> {
        self.create_with_generator(owner, input, api_token::generate)
            .await
    }

    /// Insert with bounded regeneration on token-string collision. The
    /// generator is injected so the collision path stays testable despite
    /// the random suffix.
    async fn create_with_generator<F>(
        &self,
        owner: &Account,
        input: NewApiToken,
        generate: F,
    ) -> Result<api_tokens::Model>
    where
        F: Fn(&str) -> String,
    {
        let now = chrono::Utc::now().to_rfc3339();

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let token = generate(&owner.username);

            let active = api_tokens::ActiveModel {
                token: Set(token),
                name: Set(input.name.clone()),
                description: Set(input.description.clone()),
                user_id: Set(owner.id),
                is_active: Set(true),
                created_at: Set(now.clone()),
                expires_at: Set(input.expires_at.clone()),
                last_used_at: Set(None),
                ..Default::default()
            };

            match active.insert(&self.conn).await {
                Ok(model) => return Ok(model),
                Err(err)
                    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    warn!(attempt, "API token string collision, regenerating");
                }
                Err(err) => return Err(err).context("Failed to insert API token"),
            }
        }

        anyhow::bail!(
            "Gave up inserting API token after {MAX_GENERATION_ATTEMPTS} collisions"
        )
    }

    /// Exact-match lookup over active tokens only.
    pub async fn get_active_by_string(
        &self,
        token_string: &str,
    ) -> Result<Option<api_tokens::Model>> {
        let token = api_tokens::Entity::find()
            .filter(api_tokens::Column::Token.eq(token_string))
            .filter(api_tokens::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query API token by string")?;

        Ok(token)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<api_tokens::Model>> {
        let token = api_tokens::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query API token by ID")?;

        Ok(token)
    }

    /// Active tokens owned by `user_id`, in insertion order. Callers must
    /// not depend on the ordering beyond stability for a given store state.
    pub async fn list_active_by_owner(&self, user_id: i32) -> Result<Vec<api_tokens::Model>> {
        let tokens = api_tokens::Entity::find()
            .filter(api_tokens::Column::UserId.eq(user_id))
            .filter(api_tokens::Column::IsActive.eq(true))
            .order_by_asc(api_tokens::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list API tokens")?;

        Ok(tokens)
    }

    /// Soft-deletes the token iff it exists, is still active, and is owned
    /// by `user_id`. Returns `false` without mutating otherwise.
    pub async fn revoke(&self, token_id: i32, user_id: i32) -> Result<bool> {
        let token = api_tokens::Entity::find()
            .filter(api_tokens::Column::Id.eq(token_id))
            .filter(api_tokens::Column::UserId.eq(user_id))
            .filter(api_tokens::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query API token for revocation")?;

        let Some(token) = token else {
            return Ok(false);
        };

        let mut active: api_tokens::ActiveModel = token.into();
        active.is_active = Set(false);
        active
            .update(&self.conn)
            .await
            .context("Failed to revoke API token")?;

        Ok(true)
    }

    /// Best-effort `last_used_at` touch. Not atomic with the read that
    /// triggered it; concurrent validations race last-write-wins.
    pub async fn touch_last_used(&self, token_id: i32) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = api_tokens::ActiveModel {
            id: Set(token_id),
            last_used_at: Set(Some(now)),
            ..Default::default()
        };

        active
            .update(&self.conn)
            .await
            .context("Failed to update API token last_used_at")?;

        Ok(())
    }
}
