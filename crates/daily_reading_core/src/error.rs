//! crates/daily_reading_core/src/error.rs
//!
//! The error type returned by the application services. Each variant maps to
//! one code of the public error taxonomy.

use crate::ports::PortError;
use crate::validation::FieldIssue;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing input; always carries every violated field.
    #[error("Request validation failed.")]
    Validation(Vec<FieldIssue>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You do not have permission to access this resource.")]
    Forbidden,

    /// The referenced entity does not exist (`PLAN_NOT_FOUND`, `NOT_FOUND`).
    #[error("{message}")]
    NotFound {
        code: &'static str,
        message: &'static str,
    },

    /// A uniqueness rule rejected the write (`DUPLICATE_DATE`, `EMAIL_TAKEN`).
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: &'static str,
    },

    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// Unexpected store or runtime failure. Never retried.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(field: &str, issue: &str) -> Self {
        Self::Validation(vec![FieldIssue::new(field, issue)])
    }

    pub fn plan_not_found() -> Self {
        Self::NotFound {
            code: "PLAN_NOT_FOUND",
            message: "Reading plan not found for the provided date.",
        }
    }

    pub fn duplicate_date() -> Self {
        Self::Conflict {
            code: "DUPLICATE_DATE",
            message: "A reading plan for this date already exists.",
        }
    }

    /// The machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound { code, .. } | Self::Conflict { code, .. } => *code,
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<Vec<FieldIssue>> for ServiceError {
    fn from(issues: Vec<FieldIssue>) -> Self {
        Self::Validation(issues)
    }
}

impl From<PortError> for ServiceError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound(_) => Self::NotFound {
                code: "NOT_FOUND",
                message: "Resource not found.",
            },
            PortError::Conflict(_) => Self::Conflict {
                code: "CONFLICT",
                message: "The request conflicts with existing data.",
            },
            PortError::Unauthorized => Self::Unauthorized("Authentication required.".to_string()),
            PortError::Unexpected(message) => Self::Internal(message),
        }
    }
}
