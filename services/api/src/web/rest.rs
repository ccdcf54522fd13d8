//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{
    announcements, auth, devices, health, notifications, plans, reading, verses,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        plans::today_handler,
        plans::list_handler,
        plans::admin_create_handler,
        plans::admin_list_handler,
        plans::admin_update_handler,
        plans::admin_delete_handler,
        plans::bulk_import_handler,
        reading::complete_handler,
        reading::history_handler,
        verses::create_handler,
        verses::list_handler,
        verses::delete_handler,
        devices::register_handler,
        devices::unregister_handler,
        announcements::create_handler,
        announcements::list_handler,
        notifications::send_today_handler,
        health::health_handler,
        health::version_handler,
        health::db_ping_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            plans::PlanEntryRequest,
            plans::BulkImportRequest,
            reading::CompletionRequest,
            verses::VerseRequest,
            devices::DeviceRequest,
            announcements::AnnouncementRequest,
        )
    ),
    tags(
        (name = "Daily Reading API", description = "Daily Bible reading schedule, progress tracking and reminders.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_the_core_endpoints() {
        let doc = ApiDoc::openapi();
        for path in [
            "/reading/complete",
            "/reading/history",
            "/admin/plans/bulk-import",
            "/admin/plans/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
