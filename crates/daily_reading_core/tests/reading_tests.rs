use std::sync::Arc;

use chrono::NaiveDate;
use daily_reading_core::dates::RangeQuery;
use daily_reading_core::memory::InMemoryDatabase;
use daily_reading_core::services::{HistorySummary, PlanService, ReadingService};
use daily_reading_core::{ReadingMethod, ServiceError};
use serde_json::json;

const USER: i64 = 7;

async fn setup(dates: &[&str]) -> (InMemoryDatabase, ReadingService) {
    let db = InMemoryDatabase::new();
    let plans = PlanService::new(Arc::new(db.clone()));
    for (i, date) in dates.iter().enumerate() {
        plans
            .create(&json!({ "date": date, "testament": "new", "book": "Luke", "chapter": i + 1 }))
            .await
            .unwrap();
    }
    let service = ReadingService::new(Arc::new(db.clone()));
    (db, service)
}

fn range(from: &str, to: &str) -> RangeQuery {
    RangeQuery {
        from: Some(from.to_string()),
        to: Some(to.to_string()),
    }
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn completing_twice_returns_the_first_record() {
    let (db, service) = setup(&["2024-01-01"]).await;

    let first = service
        .complete(USER, &json!({ "date": "2024-01-01", "method": "physical" }))
        .await
        .unwrap();
    let second = service
        .complete(USER, &json!({ "date": "2024-01-01", "method": "digital" }))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.method, ReadingMethod::Physical);
    assert_eq!(second.completed_at, first.completed_at);
    assert_eq!(db.record_count(), 1);
}

#[tokio::test]
async fn completion_needs_a_plan() {
    let (_db, service) = setup(&[]).await;

    let err = service
        .complete(USER, &json!({ "date": "2024-01-01", "method": "digital" }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PLAN_NOT_FOUND");
}

#[tokio::test]
async fn completion_reports_every_bad_field() {
    let (_db, service) = setup(&[]).await;

    let err = service
        .complete(USER, &json!({ "date": "2024-13-01", "method": "audio" }))
        .await
        .unwrap_err();
    let ServiceError::Validation(issues) = err else {
        panic!("expected validation error");
    };
    let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
    assert_eq!(fields, ["date", "method"]);
}

#[tokio::test]
async fn different_users_complete_independently() {
    let (db, service) = setup(&["2024-01-01"]).await;

    let a = service
        .complete(1, &json!({ "date": "2024-01-01", "method": "digital" }))
        .await
        .unwrap();
    let b = service
        .complete(2, &json!({ "date": "2024-01-01", "method": "digital" }))
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(db.record_count(), 2);
}

#[tokio::test]
async fn empty_window_has_an_empty_history() {
    let (_db, service) = setup(&["2024-01-10"]).await;

    let history = service.history(USER, &range("2024-01-01", "2024-01-05")).await.unwrap();

    assert!(history.plans.is_empty());
    assert!(history.records.is_empty());
    assert!(history.missed_dates.is_empty());
    assert_eq!(history.summary, HistorySummary::default());
}

#[tokio::test]
async fn history_joins_plans_records_and_streaks() {
    let (_db, service) = setup(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-05"]).await;
    for day in ["2024-01-01", "2024-01-02", "2024-01-05"] {
        service
            .complete(USER, &json!({ "date": day, "method": "digital" }))
            .await
            .unwrap();
    }

    let history = service.history(USER, &range("2024-01-01", "2024-01-31")).await.unwrap();

    assert_eq!(history.plans.len(), 4);
    let record_dates: Vec<_> = history.records.iter().map(|r| r.date).collect();
    assert_eq!(record_dates, [date("2024-01-01"), date("2024-01-02"), date("2024-01-05")]);
    assert_eq!(history.missed_dates, [date("2024-01-03")]);
    assert_eq!(
        history.summary,
        HistorySummary {
            completed_count: 3,
            missed_count: 1,
            current_streak: 1,
            longest_streak: 2,
        }
    );
}

#[tokio::test]
async fn streaks_depend_on_the_window() {
    let (_db, service) = setup(&["2024-01-01", "2024-01-02", "2024-01-03"]).await;
    for day in ["2024-01-01", "2024-01-02"] {
        service
            .complete(USER, &json!({ "date": day, "method": "physical" }))
            .await
            .unwrap();
    }

    let whole = service.history(USER, &range("2024-01-01", "2024-01-03")).await.unwrap();
    assert_eq!(whole.summary.current_streak, 0);
    assert_eq!(whole.summary.longest_streak, 2);

    let early = service.history(USER, &range("2024-01-01", "2024-01-02")).await.unwrap();
    assert_eq!(early.summary.current_streak, 2);
}

#[tokio::test]
async fn history_ignores_other_users() {
    let (_db, service) = setup(&["2024-01-01"]).await;
    service
        .complete(99, &json!({ "date": "2024-01-01", "method": "physical" }))
        .await
        .unwrap();

    let history = service.history(USER, &range("2024-01-01", "2024-01-01")).await.unwrap();
    assert!(history.records.is_empty());
    assert_eq!(history.summary.missed_count, 1);
}

#[tokio::test]
async fn inverted_window_is_rejected() {
    let (_db, service) = setup(&[]).await;

    let err = service.history(USER, &range("2024-02-01", "2024-01-01")).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn store_failures_surface_as_internal_errors() {
    let (db, service) = setup(&["2024-01-01"]).await;
    db.set_offline(true);

    let err = service
        .complete(USER, &json!({ "date": "2024-01-01", "method": "physical" }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INTERNAL_ERROR");
}
