use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::security::SessionCodec;
use crate::services::{AuthService, SeaOrmAuthService};

pub mod auth;
mod error;
mod system;
pub mod tokens;
mod types;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub store: Store,
    pub auth: Arc<dyn AuthService>,
    pub config: Config,
}

/// Account resolved by the session middleware, available to protected
/// handlers via request extensions.
#[derive(Clone)]
pub struct CurrentUser(pub crate::db::Account);

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let sessions = SessionCodec::new(&config.jwt)?;
    let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(store.clone(), sessions));

    Ok(Arc::new(AppState {
        store,
        auth,
        config,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/auth/tokens",
            get(tokens::list_tokens).post(tokens::create_token),
        )
        .route("/auth/tokens/{id}", delete(tokens::revoke_token))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors_origins = &state.config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/validate", post(auth::validate_token))
        .route("/auth/validate-jwt", post(auth::validate_session))
        .route("/health", get(system::health))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Session middleware for token-management routes: resolves the caller from
/// an `Authorization: Bearer <jwt>` header and stashes the account as a
/// [`CurrentUser`] extension.
async fn require_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer credential".to_string()))?;

    // A store fault here is a 500, not a 401; only a token the service
    // actually rejected reads as unauthorized.
    let account = state
        .auth
        .validate_session_token(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

    request.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}
