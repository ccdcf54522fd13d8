//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use daily_reading_core::{ServiceError, User};
use std::sync::Arc;
use tracing::debug;

use crate::web::response::AppError;
use crate::web::state::AppState;

/// The caller resolved from the bearer token, stored in request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that validates the bearer token and resolves the user.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 `UNAUTHORIZED`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .ok_or_else(|| {
            ServiceError::Unauthorized("Missing or invalid Authorization header.".to_string())
        })?;

    let user = state.accounts.resolve(&token).await?;
    debug!(user_id = user.id, "Request authenticated");

    req.extensions_mut().insert(AuthUser { user, token });
    Ok(next.run(req).await)
}

/// Must run after `require_auth`; rejects non-admins with 403 `FORBIDDEN`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = req
        .extensions()
        .get::<AuthUser>()
        .map_or(false, |auth| auth.user.is_admin());
    if !is_admin {
        return Err(ServiceError::Forbidden.into());
    }
    Ok(next.run(req).await)
}
