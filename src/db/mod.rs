use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use crate::entities::api_tokens::Model as ApiToken;
pub use repositories::token::NewApiToken;
pub use repositories::user::{Account, NewAccount};

/// Facade over the connection pool. All reads and writes go through the
/// per-aggregate repositories; each public method is one logical operation
/// executed against the store's native transaction guarantees.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>> {
        self.user_repo().get_by_username_with_password(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<Account>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn insert_user(&self, account: NewAccount) -> Result<Account> {
        self.user_repo().insert(account).await
    }

    pub async fn create_api_token(
        &self,
        owner: &Account,
        input: NewApiToken,
    ) -> Result<ApiToken> {
        self.token_repo().create(owner, input).await
    }

    pub async fn get_active_api_token(&self, token_string: &str) -> Result<Option<ApiToken>> {
        self.token_repo().get_active_by_string(token_string).await
    }

    pub async fn get_api_token_by_id(&self, id: i32) -> Result<Option<ApiToken>> {
        self.token_repo().get_by_id(id).await
    }

    pub async fn list_active_api_tokens(&self, user_id: i32) -> Result<Vec<ApiToken>> {
        self.token_repo().list_active_by_owner(user_id).await
    }

    pub async fn revoke_api_token(&self, token_id: i32, user_id: i32) -> Result<bool> {
        self.token_repo().revoke(token_id, user_id).await
    }

    pub async fn touch_api_token(&self, token_id: i32) -> Result<()> {
        self.token_repo().touch_last_used(token_id).await
    }
}
