//! services/api/src/web/response.rs
//!
//! The JSON envelope shared by every endpoint:
//! `{ok: true, data}` on success and `{ok: false, error: {code, message, details}}`
//! on failure.

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use daily_reading_core::ServiceError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

#[derive(Serialize)]
struct Envelope<T> {
    ok: bool,
    data: T,
}

/// 200 with `data` wrapped in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope { ok: true, data })).into_response()
}

/// 201 with `data` wrapped in the success envelope.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope { ok: true, data })).into_response()
}

/// Builds a failure envelope by hand, for conditions outside `ServiceError`.
pub fn failure(status: StatusCode, code: &str, message: &str, details: Value) -> Response {
    let body = json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": details,
        }
    });
    (status, Json(body)).into_response()
}

/// Request bodies are read raw so that malformed JSON still yields a
/// field-level `VALIDATION_ERROR` instead of an extractor rejection.
pub fn json_payload(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!("Ignoring malformed JSON body: {}", e);
        Value::Null
    })
}

//=========================================================================================
// Error Response
//=========================================================================================

/// Wraps a `ServiceError` so handlers can use `?` and still answer with the envelope.
#[derive(Debug)]
pub struct AppError(pub ServiceError);

impl From<ServiceError> for AppError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) | ServiceError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();
        match self.0 {
            ServiceError::Validation(issues) => {
                failure(status, code, "Request validation failed.", json!(issues))
            }
            ServiceError::Internal(cause) => {
                error!("Internal error while handling request: {}", cause);
                failure(status, code, "An unexpected error occurred.", Value::Null)
            }
            other => failure(status, code, &other.to_string(), Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daily_reading_core::validation::FieldIssue;

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_carry_every_issue() {
        let error = AppError(ServiceError::Validation(vec![
            FieldIssue::new("date", "Must be a valid date in YYYY-MM-DD format"),
            FieldIssue::new("method", "Must be one of: physical, digital"),
        ]));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][1]["field"], "method");
    }

    #[tokio::test]
    async fn internal_errors_hide_their_cause() {
        let response = AppError(ServiceError::Internal("connection reset".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("connection reset"));
    }

    #[test]
    fn malformed_json_reads_as_null() {
        assert_eq!(json_payload(&Bytes::from_static(b"{not json")), Value::Null);
        assert_eq!(json_payload(&Bytes::new()), Value::Null);
        assert_eq!(json_payload(&Bytes::from_static(b"{\"a\":1}"))["a"], 1);
    }
}
