//! Lounge menu admin server
//!
//! Serves the menu document and events from JSON files and lets an
//! authenticated admin edit them.
//!
//! ```text
//! menu-server/src/
//! ├── core/    # config, state, server lifecycle
//! ├── auth/    # admin credentials, JWT, middleware
//! ├── api/     # HTTP routes and handlers
//! ├── store.rs # products.json / events.json
//! └── utils/   # logging, error re-exports
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod store;
pub mod utils;

pub use auth::{AdminCredentials, CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use store::{JsonFileStore, StoreError};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Security event on the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env` and start logging; keep the returned guard alive
pub fn setup_environment() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {}", e);
    }
    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref())
}
