mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn register_then_me() {
    let app = TestApp::new();
    let token = app.user_token("reader@example.com").await;

    let (status, body) = app.get("/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["user"]["email"], "reader@example.com");
    assert_eq!(body["data"]["user"]["role"], "user");
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/reading/history?from=2024-01-01&to=2024-01-31", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = app.get("/auth/me", Some("not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::new();
    let token = app.user_token("reader@example.com").await;

    let (status, _) = app.request(Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let app = TestApp::new();
    app.user_token("reader@example.com").await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "reader@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.user_token("reader@example.com").await;

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "email": "reader@example.com", "password": "password123", "name": "Again" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = TestApp::new();
    let token = app.user_token("reader@example.com").await;

    let (status, body) = app
        .post(
            "/admin/plans",
            Some(&token),
            json!({ "date": "2024-01-01", "testament": "old", "book": "Genesis", "chapter": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn service_endpoints_answer_without_auth() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "api");

    let (status, body) = app.get("/db/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connected"], true);

    app.db.set_offline(true);
    let (status, body) = app.get("/db/ping", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "DB_CONNECT_FAILED");
}
