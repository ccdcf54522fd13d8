//! services/api/src/web/health.rs

use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::web::response::{failure, ok};
use crate::web::state::AppState;

/// GET /health
#[utoipa::path(get, path = "/health", tag = "service", responses((status = 200, description = "Service is up")))]
pub async fn health_handler() -> Response {
    ok(json!({ "service": "api" }))
}

/// GET /version
#[utoipa::path(get, path = "/version", tag = "service", responses((status = 200, description = "Build version")))]
pub async fn version_handler() -> Response {
    ok(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// GET /db/ping - Round-trips a query to the store
#[utoipa::path(
    get,
    path = "/db/ping",
    tag = "service",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 500, description = "DB_CONNECT_FAILED")
    )
)]
pub async fn db_ping_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.db.ping().await {
        Ok(()) => ok(json!({ "connected": true })),
        Err(e) => {
            error!("Database ping failed: {:?}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_CONNECT_FAILED",
                "Could not reach the database.",
                Value::Null,
            )
        }
    }
}
