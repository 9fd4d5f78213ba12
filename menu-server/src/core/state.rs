use std::sync::Arc;

use crate::auth::{AdminCredentials, JwtService};
use crate::core::{Config, Result};
use crate::store::JsonFileStore;

/// Server state, shared by every handler
///
/// Cloning is cheap: every service sits behind an `Arc`.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | config | Config | Immutable configuration |
/// | store | Arc<JsonFileStore> | Menu and event files |
/// | jwt_service | Arc<JwtService> | Token issuing and validation |
///
/// # Example
///
/// ```ignore
/// let state = ServerState::initialize(&config).await?;
/// let menu = state.store.menu().await?;
/// ```
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<JsonFileStore>,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, store: Arc<JsonFileStore>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            config,
            store,
            jwt_service,
        }
    }

    /// Open the data directory and build the services
    pub async fn initialize(config: &Config) -> Result<Self> {
        let store = JsonFileStore::open(&config.data_dir).await?;
        tracing::info!(data_dir = %config.data_dir.display(), "Menu store ready");

        let jwt_service = JwtService::with_config(config.jwt.clone());
        if !config.admin.login_enabled() {
            tracing::warn!("Admin API is read-only until ADMIN_PASSWORD or ADMIN_PASSWORD_HASH is set");
        }

        Ok(Self::new(
            config.clone(),
            Arc::new(store),
            Arc::new(jwt_service),
        ))
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn admin(&self) -> &AdminCredentials {
        &self.config.admin
    }
}
