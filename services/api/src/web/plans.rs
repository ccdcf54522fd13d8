//! services/api/src/web/plans.rs
//!
//! Reading plan endpoints: the public schedule and the admin CRUD/import surface.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
};
use daily_reading_core::dates::{today_in, RangeQuery};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::response::{created, json_payload, ok, AppError};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct PlanEntryRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `old` or `new`
    pub testament: String,
    pub book: String,
    pub chapter: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkImportRequest {
    pub entries: Vec<PlanEntryRequest>,
}

/// Unparseable query strings read as "no parameters" and fail validation downstream.
pub(crate) fn range_query(query: Result<Query<RangeQuery>, QueryRejection>) -> RangeQuery {
    query.map(|Query(q)| q).unwrap_or_default()
}

//=========================================================================================
// Public Schedule
//=========================================================================================

/// GET /plans/today - Today's plan in the configured timezone, or null
#[utoipa::path(
    get,
    path = "/plans/today",
    tag = "plans",
    responses((status = 200, description = "Returns `{plan}`; `plan` is null when nothing is scheduled"))
)]
pub async fn today_handler(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let today = today_in(state.config.timezone);
    let plan = state.plans.for_date(today).await?;
    Ok(ok(json!({ "plan": plan })))
}

/// GET /plans - Plans inside an inclusive date window
#[utoipa::path(
    get,
    path = "/plans",
    tag = "plans",
    params(
        ("from" = String, Query, description = "First date, `YYYY-MM-DD`"),
        ("to" = String, Query, description = "Last date, `YYYY-MM-DD`")
    ),
    responses(
        (status = 200, description = "Returns `{plans}` ascending by date"),
        (status = 400, description = "Bad or inverted range")
    )
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let plans = state.plans.list(&range_query(query)).await?;
    Ok(ok(json!({ "plans": plans })))
}

//=========================================================================================
// Admin
//=========================================================================================

/// POST /admin/plans - Create a single plan
#[utoipa::path(
    post,
    path = "/admin/plans",
    tag = "admin",
    request_body = PlanEntryRequest,
    responses(
        (status = 201, description = "Plan created"),
        (status = 400, description = "Validation error"),
        (status = 409, description = "DUPLICATE_DATE")
    )
)]
pub async fn admin_create_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    state.plans.create(&json_payload(&body)).await?;
    Ok(created(json!({ "created": true })))
}

/// GET /admin/plans - Plans inside an inclusive date window
#[utoipa::path(
    get,
    path = "/admin/plans",
    tag = "admin",
    params(
        ("from" = String, Query, description = "First date, `YYYY-MM-DD`"),
        ("to" = String, Query, description = "Last date, `YYYY-MM-DD`")
    ),
    responses((status = 200, description = "Returns `{plans}`"))
)]
pub async fn admin_list_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let plans = state.plans.list(&range_query(query)).await?;
    Ok(ok(json!({ "plans": plans })))
}

/// PUT /admin/plans/{id} - Rewrite a plan, its date included
#[utoipa::path(
    put,
    path = "/admin/plans/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Plan id")),
    request_body = PlanEntryRequest,
    responses(
        (status = 200, description = "Plan updated"),
        (status = 404, description = "NOT_FOUND"),
        (status = 409, description = "DUPLICATE_DATE")
    )
)]
pub async fn admin_update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    state.plans.update(&id, &json_payload(&body)).await?;
    Ok(ok(json!({ "updated": true })))
}

/// DELETE /admin/plans/{id}
#[utoipa::path(
    delete,
    path = "/admin/plans/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan deleted"),
        (status = 404, description = "NOT_FOUND")
    )
)]
pub async fn admin_delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    state.plans.delete(&id).await?;
    Ok(ok(json!({ "deleted": true })))
}

/// POST /admin/plans/bulk-import - Upsert many plans by date in one transaction
#[utoipa::path(
    post,
    path = "/admin/plans/bulk-import",
    tag = "admin",
    request_body = BulkImportRequest,
    responses(
        (status = 200, description = "Returns `{insertedCount, updatedCount, failedCount, failures}`"),
        (status = 400, description = "`entries` is not an array")
    )
)]
pub async fn bulk_import_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let report = state.plans.bulk_import(&json_payload(&body)).await?;
    Ok(ok(report))
}
