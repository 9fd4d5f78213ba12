//! Authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;

use crate::AppError;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Routes reachable without a token
///
/// Every `GET` under `/api/` except `/api/auth/me`, plus the login call.
/// Paths outside `/api/` pass through so they 404 normally.
pub fn is_public_route(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS || !path.starts_with("/api/") {
        return true;
    }
    if method == Method::GET {
        return path != "/api/auth/me";
    }
    method == Method::POST && path == "/api/auth/login"
}

/// Require a valid `Authorization: Bearer <token>` on non-public routes
///
/// On success the [`CurrentUser`] is stored in the request extensions.
///
/// | Failure | Response |
/// |---------|----------|
/// | no header | 401 NotAuthenticated |
/// | expired token | 401 TokenExpired |
/// | malformed or forged token | 401 TokenInvalid |
/// | token without admin role | 403 AdminRequired |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_route(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::unauthorized());
        }
    };

    match state.get_jwt_service().validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            if !user.is_admin() {
                security_log!("WARN", "admin_required", username = user.username.clone());
                return Err(AppError::new(shared::ErrorCode::AdminRequired));
            }
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}
