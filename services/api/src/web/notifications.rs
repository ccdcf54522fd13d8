//! services/api/src/web/notifications.rs
//!
//! The scheduler-facing trigger for the daily reminder run.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use daily_reading_core::dates::today_in;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::web::response::{failure, ok, AppError};
use crate::web::state::AppState;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Compares without short-circuiting on the first differing byte.
fn secrets_match(expected: &[u8], given: &[u8]) -> bool {
    if expected.len() != given.len() {
        return false;
    }
    expected
        .iter()
        .zip(given)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// POST /admin/notifications/send-today - Remind users who have not read today's plan
#[utoipa::path(
    post,
    path = "/admin/notifications/send-today",
    tag = "admin",
    params(("X-CRON-SECRET" = String, Header, description = "Shared scheduler secret")),
    responses(
        (status = 200, description = "Returns `{date, planId, sentCount, userCount, tokenCount, mode}` or a `reason`"),
        (status = 401, description = "Missing or wrong secret")
    )
)]
pub async fn send_today_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let given = headers
        .get(CRON_SECRET_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    let authorized = state
        .config
        .cron_secret
        .as_deref()
        .map_or(false, |expected| secrets_match(expected.as_bytes(), given));
    if !authorized {
        warn!("Rejected send-today call with a missing or wrong cron secret");
        return Ok(failure(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Invalid cron secret.",
            Value::Null,
        ));
    }

    let today = today_in(state.config.timezone);
    let report = state.notifications.send_today(today).await?;
    Ok(ok(report))
}
