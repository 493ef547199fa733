pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod security;
pub mod services;

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use api::AppState;
pub use config::Config;
use services::{AuthError, NewUser};

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("keygate v{} starting...", env!("CARGO_PKG_VERSION"));

    if config.uses_placeholder_secret() {
        warn!(
            "JWT secret is the shipped placeholder; set KEYGATE_JWT_SECRET or [jwt].secret \
             before exposing this service"
        );
    }

    let state = api::create_app_state(config.clone()).await?;

    bootstrap_admin(&state).await?;

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let app = api::router(state);

    info!("Auth service listening at http://{addr}");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server_handle.abort();
    info!("Auth service stopped");

    Ok(())
}

/// Ensures the configured admin account exists, creating it on first start.
async fn bootstrap_admin(state: &Arc<AppState>) -> anyhow::Result<()> {
    let bootstrap = &state.config.bootstrap;

    match state
        .auth
        .create_user(NewUser {
            email: bootstrap.admin_email.clone(),
            username: bootstrap.admin_username.clone(),
            password: bootstrap.admin_password.clone(),
            is_admin: true,
        })
        .await
    {
        Ok(account) => {
            info!("Created admin account: {}", account.email);
            Ok(())
        }
        Err(AuthError::Conflict(_)) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Admin bootstrap failed: {e}")),
    }
}
