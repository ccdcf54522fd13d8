//! services/api/src/web/mod.rs
//!
//! HTTP surface: routes, middleware, and the JSON envelope.

pub mod announcements;
pub mod auth;
pub mod devices;
pub mod health;
pub mod middleware;
pub mod notifications;
pub mod plans;
pub mod reading;
pub mod response;
pub mod rest;
pub mod state;
pub mod verses;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::{require_admin, require_auth};
use rest::ApiDoc;
use state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(notifications::CRON_SECRET_HEADER),
        ]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!("Ignoring unparseable CORS_ORIGIN '{}'", origin);
            layer
        }
    }
}

/// Builds the complete application: API routes, Swagger UI, CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_handler))
        .route("/version", get(health::version_handler))
        .route("/db/ping", get(health::db_ping_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/plans/today", get(plans::today_handler))
        .route("/plans", get(plans::list_handler))
        .route(
            "/admin/notifications/send-today",
            post(notifications::send_today_handler),
        );

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/reading/complete", post(reading::complete_handler))
        .route("/reading/history", get(reading::history_handler))
        .route(
            "/verses",
            post(verses::create_handler).get(verses::list_handler),
        )
        .route("/verses/{id}", delete(verses::delete_handler))
        .route("/devices/register", post(devices::register_handler))
        .route("/devices/unregister", post(devices::unregister_handler))
        .route("/announcements", get(announcements::list_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin routes (bearer token and the admin role)
    let admin_routes = Router::new()
        .route(
            "/admin/plans",
            post(plans::admin_create_handler).get(plans::admin_list_handler),
        )
        .route(
            "/admin/plans/{id}",
            put(plans::admin_update_handler).delete(plans::admin_delete_handler),
        )
        .route("/admin/plans/bulk-import", post(plans::bulk_import_handler))
        .route("/admin/announcements", post(announcements::create_handler))
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&state.config.cors_origin);

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
