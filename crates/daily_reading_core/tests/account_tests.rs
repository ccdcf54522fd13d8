use std::sync::Arc;

use chrono::Duration;
use daily_reading_core::memory::{InMemoryDatabase, PlainTextHasher};
use daily_reading_core::services::AccountService;
use daily_reading_core::{Role, ServiceError};
use serde_json::json;

fn service_with_ttl(ttl: Duration) -> AccountService {
    AccountService::new(Arc::new(InMemoryDatabase::new()), Arc::new(PlainTextHasher), ttl)
}

fn service() -> AccountService {
    service_with_ttl(Duration::days(30))
}

#[tokio::test]
async fn register_normalizes_email_and_issues_a_token() {
    let accounts = service();

    let grant = accounts
        .register(&json!({ "email": "  Reader@Example.COM ", "password": "longenough", "name": "Anna" }))
        .await
        .unwrap();

    assert_eq!(grant.user.email, "reader@example.com");
    assert_eq!(grant.user.role, Role::User);
    let resolved = accounts.resolve(&grant.token).await.unwrap();
    assert_eq!(resolved.id, grant.user.id);
}

#[tokio::test]
async fn register_validates_every_field() {
    let accounts = service();

    let err = accounts
        .register(&json!({ "email": "nope", "password": "short" }))
        .await
        .unwrap_err();
    let ServiceError::Validation(issues) = err else {
        panic!("expected validation error");
    };
    let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
    assert_eq!(fields, ["name", "email", "password"]);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let accounts = service();
    let body = json!({ "email": "a@b.lv", "password": "password1", "name": "A" });

    accounts.register(&body).await.unwrap();
    let err = accounts.register(&body).await.unwrap_err();
    assert_eq!(err.code(), "EMAIL_TAKEN");
}

#[tokio::test]
async fn login_checks_the_password() {
    let accounts = service();
    accounts
        .register(&json!({ "email": "a@b.lv", "password": "password1", "name": "A" }))
        .await
        .unwrap();

    let err = accounts
        .login(&json!({ "email": "a@b.lv", "password": "password2" }))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let err = accounts
        .login(&json!({ "email": "nobody@b.lv", "password": "password1" }))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let grant = accounts
        .login(&json!({ "email": "A@B.LV", "password": "password1" }))
        .await
        .unwrap();
    assert_eq!(grant.user.email, "a@b.lv");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let accounts = service();
    let grant = accounts
        .register(&json!({ "email": "a@b.lv", "password": "password1", "name": "A" }))
        .await
        .unwrap();

    accounts.logout(&grant.token).await.unwrap();
    let err = accounts.resolve(&grant.token).await.unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn expired_tokens_do_not_resolve() {
    let accounts = service_with_ttl(Duration::seconds(-1));
    let grant = accounts
        .register(&json!({ "email": "a@b.lv", "password": "password1", "name": "A" }))
        .await
        .unwrap();

    let err = accounts.resolve(&grant.token).await.unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");
}
