//! services/api/src/web/devices.rs

use axum::{body::Bytes, extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::middleware::AuthUser;
use crate::web::response::{json_payload, ok, AppError};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub push_token: String,
    /// `android`, `ios` or `web`; ignored on unregister.
    pub platform: Option<String>,
}

/// POST /devices/register - Attach a push token to the caller
#[utoipa::path(
    post,
    path = "/devices/register",
    tag = "devices",
    request_body = DeviceRequest,
    responses(
        (status = 200, description = "Token registered"),
        (status = 400, description = "Validation error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Response, AppError> {
    state.devices.register(auth.user.id, &json_payload(&body)).await?;
    Ok(ok(json!({ "registered": true })))
}

/// POST /devices/unregister - Remove one of the caller's push tokens
#[utoipa::path(
    post,
    path = "/devices/unregister",
    tag = "devices",
    request_body = DeviceRequest,
    responses(
        (status = 200, description = "Token removed"),
        (status = 400, description = "Validation error")
    )
)]
pub async fn unregister_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Response, AppError> {
    state
        .devices
        .unregister(auth.user.id, &json_payload(&body))
        .await?;
    Ok(ok(json!({ "unregistered": true })))
}
