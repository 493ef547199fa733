use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Placeholder signing secret used when nothing is configured. Deployments
/// must override it via config or `KEYGATE_JWT_SECRET`.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-this-development-jwt-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/keygate.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

/// Session token signing configuration. Loaded once at startup and passed to
/// [`crate::security::SessionCodec::new`]; never read as ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,

    /// Symmetric algorithm name: HS256 (default), HS384 or HS512.
    pub algorithm: String,

    pub access_token_ttl_minutes: u32,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: PLACEHOLDER_JWT_SECRET.to_string(),
            algorithm: "HS256".to_string(),
            access_token_ttl_minutes: 30,
        }
    }
}

/// Admin account seeded at startup when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_email: String,

    pub admin_username: String,

    pub admin_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@example.com".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            jwt: JwtConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over file values. Names follow the original
    /// deployment contract (`JWT_*`, `ADMIN_*`).
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("KEYGATE_JWT_SECRET")
            .or_else(|_| std::env::var("JWT_SECRET_KEY"))
        {
            self.jwt.secret = secret;
        }
        if let Ok(algorithm) = std::env::var("JWT_ALGORITHM") {
            self.jwt.algorithm = algorithm;
        }
        if let Ok(minutes) = std::env::var("JWT_ACCESS_TOKEN_EXPIRE_MINUTES")
            && let Ok(minutes) = minutes.parse()
        {
            self.jwt.access_token_ttl_minutes = minutes;
        }
        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            self.bootstrap.admin_email = email;
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            self.bootstrap.admin_password = password;
        }
        if let Ok(origins) = std::env::var("CORS_ALLOW_ORIGINS") {
            self.server.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("keygate").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".keygate").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }

        if self.jwt.access_token_ttl_minutes == 0 {
            anyhow::bail!("Session TTL must be > 0 minutes");
        }

        if !matches!(self.jwt.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            anyhow::bail!("Unsupported JWT algorithm: {}", self.jwt.algorithm);
        }

        Ok(())
    }

    /// True when the signing secret is still the shipped placeholder.
    #[must_use]
    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt.secret == PLACEHOLDER_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.jwt.access_token_ttl_minutes, 30);
        assert_eq!(config.server.port, 8000);
        assert!(config.uses_placeholder_secret());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[jwt]"));
        assert!(toml_str.contains("[bootstrap]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [jwt]
            secret = "deployment-secret"
            access_token_ttl_minutes = 15
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.jwt.secret, "deployment-secret");
        assert_eq!(config.jwt.access_token_ttl_minutes, 15);
        assert!(!config.uses_placeholder_secret());

        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_validate_rejects_bad_algorithm() {
        let mut config = Config::default();
        config.jwt.algorithm = "RS256".to_string();
        assert!(config.validate().is_err());
    }
}
