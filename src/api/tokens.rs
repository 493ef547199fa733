use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::types::{ApiTokenDto, CreateTokenRequest, MessageResponse};
use super::{ApiError, AppState, CurrentUser};
use crate::db::NewApiToken;

/// GET /auth/tokens
/// List the caller's active API tokens.
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
) -> Result<Json<Vec<ApiTokenDto>>, ApiError> {
    let tokens = state.auth.list_api_tokens(account.id).await?;

    Ok(Json(tokens.into_iter().map(ApiTokenDto::from).collect()))
}

/// POST /auth/tokens
/// Create a new API token for the caller.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<ApiTokenDto>), ApiError> {
    let token = state
        .auth
        .create_api_token(
            account.id,
            NewApiToken {
                name: payload.name,
                description: payload.description,
                expires_at: payload.expires_at,
            },
        )
        .await?;

    info!("API token '{}' created for user {}", token.name, account.username);

    Ok((StatusCode::CREATED, Json(token.into())))
}

/// DELETE /auth/tokens/{id}
/// Revoke one of the caller's API tokens.
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(account)): Extension<CurrentUser>,
    Path(token_id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let revoked = state.auth.revoke_api_token(token_id, account.id).await?;

    if !revoked {
        return Err(ApiError::token_not_found(token_id));
    }

    info!("API token {token_id} revoked by user {}", account.username);

    Ok(Json(MessageResponse {
        message: "Token revoked successfully".to_string(),
    }))
}
