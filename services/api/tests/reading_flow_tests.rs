mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, CRON_SECRET};
use axum::body::Body;
use axum::http::Request;
use daily_reading_core::dates::today_in;
use serde_json::json;

async fn seed_january(app: &TestApp, admin: &str) {
    let (status, body) = app
        .post(
            "/admin/plans/bulk-import",
            Some(admin),
            json!({ "entries": [
                { "date": "2024-01-01", "testament": "old", "book": "Genesis", "chapter": 1 },
                { "date": "2024-01-02", "testament": "old", "book": "Genesis", "chapter": "2" },
                { "date": "2024-01-03", "testament": "old", "book": "Genesis", "chapter": 3 },
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["insertedCount"], 3);
}

#[tokio::test]
async fn bulk_import_reports_failures_by_original_index() {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let (status, body) = app
        .post(
            "/admin/plans/bulk-import",
            Some(&admin),
            json!({ "entries": [
                { "date": "2024-01-01", "testament": "old", "book": "Genesis", "chapter": 1 },
                { "date": "2024-01-02", "testament": "old", "book": "Genesis", "chapter": 0 },
                { "date": "2024-01-03", "testament": "new", "book": "Matthew", "chapter": 1 },
            ]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["insertedCount"], 2);
    assert_eq!(data["updatedCount"], 0);
    assert_eq!(data["failedCount"], 1);
    assert_eq!(data["failures"][0]["index"], 1);
    assert_eq!(data["failures"][0]["issues"][0]["field"], "chapter");
}

#[tokio::test]
async fn bulk_import_requires_an_entries_array() {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let (status, body) = app
        .post("/admin/plans/bulk-import", Some(&admin), json!({ "entries": "nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["field"], "entries");
}

#[tokio::test]
async fn complete_and_read_history() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    seed_january(&app, &admin).await;
    let token = app.user_token("reader@example.com").await;

    let (status, first) = app
        .post("/reading/complete", Some(&token), json!({ "date": "2024-01-01", "method": "physical" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    let (_, again) = app
        .post("/reading/complete", Some(&token), json!({ "date": "2024-01-01", "method": "digital" }))
        .await;
    assert_eq!(first["data"]["record"]["id"], again["data"]["record"]["id"]);
    assert_eq!(again["data"]["record"]["method"], "physical");

    app.post("/reading/complete", Some(&token), json!({ "date": "2024-01-02", "method": "digital" }))
        .await;

    let (status, body) = app
        .get("/reading/history?from=2024-01-01&to=2024-01-03", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["plans"].as_array().unwrap().len(), 3);
    assert_eq!(data["records"].as_array().unwrap().len(), 2);
    assert_eq!(data["missedDates"], json!(["2024-01-03"]));
    assert_eq!(
        data["summary"],
        json!({ "completedCount": 2, "missedCount": 1, "currentStreak": 0, "longestStreak": 2 })
    );
}

#[tokio::test]
async fn completion_errors_use_the_envelope() {
    let app = TestApp::new();
    let token = app.user_token("reader@example.com").await;

    let (status, body) = app
        .post("/reading/complete", Some(&token), json!({ "date": "2024-02-30", "method": "audio" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .post("/reading/complete", Some(&token), json!({ "date": "2024-05-05", "method": "digital" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PLAN_NOT_FOUND");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/reading/complete")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from("{broken"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn inverted_history_window_is_rejected() {
    let app = TestApp::new();
    let token = app.user_token("reader@example.com").await;

    let (status, body) = app
        .get("/reading/history?from=2024-02-01&to=2024-01-01", Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "to");
}

#[tokio::test]
async fn admin_plan_crud() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    seed_january(&app, &admin).await;

    let (status, body) = app
        .post(
            "/admin/plans",
            Some(&admin),
            json!({ "date": "2024-01-02", "testament": "new", "book": "John", "chapter": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_DATE");

    let (_, listed) = app
        .get("/admin/plans?from=2024-01-01&to=2024-01-31", Some(&admin))
        .await;
    let first_id = listed["data"]["plans"][0]["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/admin/plans/{first_id}"),
            Some(&admin),
            Some(json!({ "date": "2024-01-03", "testament": "old", "book": "Exodus", "chapter": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_DATE");

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/admin/plans/{first_id}"),
            Some(&admin),
            Some(json!({ "date": "2024-01-10", "testament": "old", "book": "Exodus", "chapter": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(Method::PUT, "/admin/plans/abc", Some(&admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "id");

    let (status, _) = app
        .request(Method::DELETE, &format!("/admin/plans/{first_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .request(Method::DELETE, &format!("/admin/plans/{first_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn today_plan_and_reminders() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let today = today_in(app.config.timezone).format("%Y-%m-%d").to_string();

    let (status, body) = app.get("/plans/today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["plan"].is_null());

    app.post(
        "/admin/plans",
        Some(&admin),
        json!({ "date": today, "testament": "new", "book": "Mark", "chapter": 4 }),
    )
    .await;
    let (_, body) = app.get("/plans/today", None).await;
    assert_eq!(body["data"]["plan"]["book"], "Mark");

    let reader = app.user_token("reader@example.com").await;
    app.post(
        "/devices/register",
        Some(&reader),
        json!({ "pushToken": "device-1", "platform": "android" }),
    )
    .await;

    let (status, _) = app
        .request(Method::POST, "/admin/notifications/send-today", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/notifications/send-today")
        .header("x-cron-secret", CRON_SECRET)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["sentCount"], 1);
    assert_eq!(body["data"]["userCount"], 1);
    assert_eq!(body["data"]["mode"], "memory");
    assert_eq!(app.notifier.sent()[0].tokens, ["device-1"]);
}

#[tokio::test]
async fn verses_and_announcements() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let reader = app.user_token("reader@example.com").await;

    let (status, body) = app
        .post("/verses", Some(&reader), json!({ "referenceText": "John 3:16", "note": null }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let verse_id = body["data"]["verse"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["verse"]["reference_text"], "John 3:16");

    let (_, body) = app.get("/verses?page=1&pageSize=10", Some(&reader)).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["pageSize"], 10);

    let (status, _) = app.get("/verses?page=0", Some(&reader)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(Method::DELETE, &format!("/verses/{verse_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .request(Method::DELETE, &format!("/verses/{verse_id}"), Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/admin/announcements", Some(&reader), json!({ "title": "Hi", "body": "There" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .post("/admin/announcements", Some(&admin), json!({ "title": "Hi", "body": "There" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/announcements?pageSize=999", Some(&reader)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pageSize"], 50);
    assert_eq!(body["data"]["announcements"][0]["title"], "Hi");
}
