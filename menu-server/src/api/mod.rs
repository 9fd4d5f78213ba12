//! API routes
//!
//! - [`health`] - liveness check
//! - [`auth`] - admin login
//! - [`products`] - menu document and product CRUD
//! - [`categories`] - category CRUD
//! - [`events`] - event CRUD
//! - [`settings`] - languages, guest WiFi, social links, video table
//!
//! Successful calls return the resource as plain JSON; failures use the
//! [`ApiResponse`](crate::ApiResponse) envelope.

pub mod auth;
pub mod categories;
pub mod events;
pub mod health;
pub mod products;
pub mod settings;

pub use crate::utils::{AppError, AppResult};
