//! services/api/src/error.rs
//!
//! Errors that can stop the `api` binary before or while it serves requests.
//! Request-level failures are `web::response::AppError` instead.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment did not describe a usable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The connection pool could not reach PostgreSQL.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
