//! services/api/src/web/verses.rs

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
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

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerseRequest {
    /// Optional `YYYY-MM-DD`; links the verse to that day's plan when one exists.
    pub date: Option<String>,
    pub reference_text: String,
    pub note: Option<String>,
}

pub(crate) fn page_query(query: Result<Query<PageQuery>, QueryRejection>) -> PageQuery {
    query.map(|Query(q)| q).unwrap_or_default()
}

/// POST /verses - Save a verse reference
#[utoipa::path(
    post,
    path = "/verses",
    tag = "verses",
    request_body = VerseRequest,
    responses(
        (status = 201, description = "Returns `{verse}`"),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Response, AppError> {
    let verse = state.verses.create(auth.user.id, &json_payload(&body)).await?;
    Ok(created(json!({ "verse": verse })))
}

/// GET /verses - The caller's saved verses, newest first
#[utoipa::path(
    get,
    path = "/verses",
    tag = "verses",
    params(
        ("page" = Option<i64>, Query, description = "Defaults to 1"),
        ("pageSize" = Option<i64>, Query, description = "Defaults to 20")
    ),
    responses(
        (status = 200, description = "Returns `{items, page, pageSize, total}`"),
        (status = 400, description = "Non-positive page or page size")
    )
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let page = state.verses.list(auth.user.id, &page_query(query)).await?;
    Ok(ok(page))
}

/// DELETE /verses/{id} - Delete one of the caller's verses
#[utoipa::path(
    delete,
    path = "/verses/{id}",
    tag = "verses",
    params(("id" = i64, Path, description = "Verse id")),
    responses(
        (status = 200, description = "Verse deleted"),
        (status = 404, description = "NOT_FOUND")
    )
)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    state.verses.delete(auth.user.id, &id).await?;
    Ok(ok(json!({ "deleted": true })))
}
