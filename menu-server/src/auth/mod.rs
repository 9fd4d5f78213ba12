//! Authentication
//!
//! - [`AdminCredentials`] - the configured admin account
//! - [`JwtService`] - token issuing and validation
//! - [`CurrentUser`] - caller context from a validated token
//! - [`require_auth`] - middleware guarding write routes

pub mod admin;
pub mod extractor;
pub mod jwt;
pub mod middleware;

/// Role carried by admin tokens
pub const ADMIN_ROLE: &str = "admin";

pub use admin::{AdminCredentials, hash_password};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{is_public_route, require_auth};
