//! Authentication Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use serde::Serialize;
use shared::{LoginRequest, LoginResponse};

use crate::AppError;
use crate::auth::{ADMIN_ROLE, CurrentUser};
use crate::core::ServerState;
use crate::security_log;

/// Every login attempt takes at least this long
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/login
///
/// Same error for unknown user, wrong password and disabled login.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let admin = state.admin().clone();
    let username = req.username.clone();

    let verified = tokio::task::spawn_blocking(move || admin.verify(&req.username, &req.password));
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;
    let verified = verified
        .await
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

    if !verified {
        security_log!("WARN", "login_failed", username = username.clone());
        return Err(AppError::invalid_credentials());
    }

    let (token, expires_at) = state
        .get_jwt_service()
        .generate_token(&username, &username, ADMIN_ROLE)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!("INFO", "login_success", username = username.clone());

    Ok(Json(LoginResponse {
        token,
        expires_at,
        username,
    }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    })
}
