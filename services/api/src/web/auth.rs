//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, logout and the current user.

use axum::{body::Bytes, extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::middleware::AuthUser;
use crate::web::response::{created, json_payload, ok, AppError};
use crate::web::state::AppState;

//=========================================================================================
// Request Types (documentation only; bodies are validated by the core services)
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; returns `{token, user}`"),
        (status = 400, description = "Validation error"),
        (status = 409, description = "EMAIL_TAKEN")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let grant = state.accounts.register(&json_payload(&body)).await?;
    Ok(created(grant))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; returns `{token, user}`"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "INVALID_CREDENTIALS")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let grant = state.accounts.login(&json_payload(&body)).await?;
    Ok(ok(grant))
}

/// POST /auth/logout - Revoke the bearer token of this request
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "UNAUTHORIZED")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, AppError> {
    state.accounts.logout(&auth.token).await?;
    Ok(ok(json!({ "loggedOut": true })))
}

/// GET /auth/me - The authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Returns `{user}`"),
        (status = 401, description = "UNAUTHORIZED")
    )
)]
pub async fn me_handler(Extension(auth): Extension<AuthUser>) -> Response {
    ok(json!({ "user": auth.user }))
}
