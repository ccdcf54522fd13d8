//! services/api/src/web/reading.rs

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
    Extension,
};
use daily_reading_core::dates::RangeQuery;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::middleware::AuthUser;
use crate::web::plans::range_query;
use crate::web::response::{json_payload, ok, AppError};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct CompletionRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `physical` or `digital`
    pub method: String,
}

/// POST /reading/complete - Mark the plan of a date as read
///
/// Completing the same plan again returns the first record unchanged.
#[utoipa::path(
    post,
    path = "/reading/complete",
    tag = "reading",
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Returns `{record}`"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "PLAN_NOT_FOUND")
    )
)]
pub async fn complete_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: Bytes,
) -> Result<Response, AppError> {
    let record = state
        .reading
        .complete(auth.user.id, &json_payload(&body))
        .await?;
    Ok(ok(json!({ "record": record })))
}

/// GET /reading/history - Plans, records, missed dates and streaks for a window
#[utoipa::path(
    get,
    path = "/reading/history",
    tag = "reading",
    params(
        ("from" = String, Query, description = "First date, `YYYY-MM-DD`"),
        ("to" = String, Query, description = "Last date, `YYYY-MM-DD`")
    ),
    responses(
        (status = 200, description = "Returns `{plans, records, missedDates, summary}`"),
        (status = 400, description = "Bad or inverted range")
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let history = state
        .reading
        .history(auth.user.id, &range_query(query))
        .await?;
    Ok(ok(history))
}
