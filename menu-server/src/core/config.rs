use std::path::PathBuf;

use crate::auth::{AdminCredentials, JwtConfig};

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | DATA_DIR | ./data | Directory holding products.json and events.json |
/// | HTTP_PORT | 3001 | HTTP port |
/// | ENVIRONMENT | development | Environment name |
/// | ADMIN_USERNAME | admin | Admin login name |
/// | ADMIN_PASSWORD_HASH | - | Argon2 PHC hash of the admin password |
/// | ADMIN_PASSWORD | - | Plain admin password, hashed at startup |
/// | CORS_ALLOW_ORIGIN | * | Allowed origin for the admin UI |
/// | LOG_LEVEL | info | Default log level when RUST_LOG is unset |
/// | LOG_DIR | - | Also write daily rolling log files here |
///
/// JWT settings are read by [`JwtConfig`] (`JWT_SECRET`,
/// `JWT_EXPIRATION_MINUTES`, `JWT_ISSUER`, `JWT_AUDIENCE`).
///
/// # Example
///
/// ```ignore
/// DATA_DIR=/srv/menu HTTP_PORT=8080 cargo run -p menu-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub admin: AdminCredentials,
    pub jwt: JwtConfig,
    /// `None` or `*` allows any origin
    pub cors_allow_origin: Option<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from the environment, with defaults
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            admin: AdminCredentials::from_env(),
            jwt: JwtConfig::default(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// Override the data directory and port; used by tests
    pub fn with_overrides(data_dir: impl Into<PathBuf>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn with_admin(mut self, admin: AdminCredentials) -> Self {
        self.admin = admin;
        self
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
