//! Shared fixtures for the HTTP tests: the real router over the in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use daily_reading_core::memory::{InMemoryDatabase, PlainTextHasher, RecordingNotifier};
use daily_reading_core::ports::DatabaseService;
use daily_reading_core::Role;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const CRON_SECRET: &str = "cron-test-secret";

pub struct TestApp {
    pub app: Router,
    pub db: InMemoryDatabase,
    pub notifier: RecordingNotifier,
    pub config: Arc<Config>,
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "CRON_SECRET" => Some(CRON_SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

impl TestApp {
    pub fn new() -> Self {
        let db = InMemoryDatabase::new();
        let notifier = RecordingNotifier::new();
        let config = Arc::new(test_config());
        let state = AppState::new(
            Arc::new(db.clone()),
            Arc::new(notifier.clone()),
            Arc::new(PlainTextHasher),
            config.clone(),
        );
        Self {
            app: router(Arc::new(state)),
            db,
            notifier,
            config,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a regular user and returns its bearer token.
    pub async fn user_token(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({ "email": email, "password": "password123", "name": "Reader" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Seeds an admin directly in the store and logs in as them.
    pub async fn admin_token(&self) -> String {
        self.db
            .create_user("admin@example.com", "plain:adminpass1", "Admin", Role::Admin)
            .await
            .unwrap();
        let (status, body) = self
            .post(
                "/auth/login",
                None,
                json!({ "email": "admin@example.com", "password": "adminpass1" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }
}
