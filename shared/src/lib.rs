//! Shared types for the lounge menu
//!
//! Data model for the menu document, admin payloads, the unified error
//! system and the API response envelope. Used by both `menu-client` and
//! `menu-server`.

pub mod error;
pub mod models;
pub mod response;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    Badges, Category, Event, EventType, Language, LocalizedText, MenuDocument, MenuMetadata,
    Product, SizeVariant,
};
pub use response::{DeleteResponse, HealthResponse, LoginRequest, LoginResponse, VersionCheck};
