use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::warn;

use super::types::{
    LoginRequest, LoginResponse, TokenValidationRequest, TokenValidationResponse,
};
use super::{ApiError, AppState};

/// POST /auth/login
/// Authenticate with username and password, returns a signed session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let outcome = state.auth.login(&payload.username, &payload.password).await?;

    Ok(Json(LoginResponse {
        access_token: outcome.access_token,
        token_type: "bearer".to_string(),
        user: outcome.account.into(),
    }))
}

/// POST /auth/validate
/// Validate an opaque API token and return the owning account.
///
/// Always answers 200: failures of any kind collapse to `valid=false` so the
/// endpoint never leaks which verification step rejected the token. This is
/// the only place where unexpected service errors are swallowed; issuance
/// endpoints surface them as distinct errors.
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenValidationRequest>,
) -> Json<TokenValidationResponse> {
    match state.auth.validate_api_token(&payload.token).await {
        Ok(Some(account)) => Json(TokenValidationResponse {
            valid: true,
            user: Some(account.into()),
            error: None,
        }),
        Ok(None) => Json(invalid("Invalid or expired token")),
        Err(e) => {
            warn!("API token validation failed unexpectedly: {e}");
            Json(invalid("Token validation failed"))
        }
    }
}

/// POST /auth/validate-jwt
/// Validate a signed session token and return the owning account.
pub async fn validate_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenValidationRequest>,
) -> Json<TokenValidationResponse> {
    match state.auth.validate_session_token(&payload.token).await {
        Ok(Some(account)) => Json(TokenValidationResponse {
            valid: true,
            user: Some(account.into()),
            error: None,
        }),
        Ok(None) => Json(invalid("Invalid or expired session token")),
        Err(e) => {
            warn!("Session token validation failed unexpectedly: {e}");
            Json(invalid("Token validation failed"))
        }
    }
}

fn invalid(message: &str) -> TokenValidationResponse {
    TokenValidationResponse {
        valid: false,
        user: None,
        error: Some(message.to_string()),
    }
}
