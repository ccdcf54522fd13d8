//! services/api/src/web/announcements.rs

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
    Extension,
};
use daily_reading_core::services::PageQuery;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::middleware::AuthUser;
use crate::web::response::{created, json_payload, ok, AppError};
use crate::web::state::AppState;
use crate::web::verses::page_query;

#[derive(Deserialize, ToSchema)]
pub struct AnnouncementRequest {
    pub title: String,
    pub body: String,
}

/// POST /admin/announcements - Publish an announcement
#[utoipa::path(
    post,
    path = "/admin/announcements",
    tag = "admin",
    request_body = AnnouncementRequest,
    responses(
        (status = 201, description = "Announcement published"),
        (status = 400, description = "Validation error"),
        (status = 403, description = "FORBIDDEN")
    )
)]
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Response, AppError> {
    state
        .announcements
        .create(auth.user.id, &json_payload(&body))
        .await?;
    Ok(created(json!({ "created": true })))
}

/// GET /announcements - Newest announcements first
#[utoipa::path(
    get,
    path = "/announcements",
    tag = "announcements",
    params(
        ("page" = Option<i64>, Query, description = "Falls back to 1"),
        ("pageSize" = Option<i64>, Query, description = "1 to 50; falls back to 50")
    ),
    responses((status = 200, description = "Returns `{announcements, page, pageSize}`"))
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let page = state.announcements.list(&page_query(query)).await?;
    Ok(ok(page))
}
