use std::sync::Arc;

use chrono::NaiveDate;
use daily_reading_core::memory::InMemoryDatabase;
use daily_reading_core::services::PlanService;
use daily_reading_core::{DatabaseService, ServiceError, Testament};
use serde_json::json;

fn setup() -> (InMemoryDatabase, PlanService) {
    let db = InMemoryDatabase::new();
    let service = PlanService::new(Arc::new(db.clone()));
    (db, service)
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn partial_failure_keeps_original_indices() {
    let (db, service) = setup();

    let report = service
        .bulk_import(&json!({
            "entries": [
                { "date": "2024-01-01", "testament": "old", "book": "Genesis", "chapter": 1 },
                { "date": "2024-01-02", "testament": "old", "book": "Genesis", "chapter": 0 },
                { "date": "2024-01-03", "testament": "old", "book": "Genesis", "chapter": "3" }
            ]
        }))
        .await
        .unwrap();

    assert_eq!(report.inserted_count + report.updated_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].issues[0].field, "chapter");
    assert_eq!(db.plans().len(), 2);
}

#[tokio::test]
async fn existing_dates_are_updated_in_place() {
    let (db, service) = setup();
    service
        .create(&json!({ "date": "2024-05-01", "testament": "old", "book": "Ruth", "chapter": 1 }))
        .await
        .unwrap();
    let original = db.find_plan_by_date(date("2024-05-01")).await.unwrap().unwrap();

    let report = service
        .bulk_import(&json!({
            "entries": [
                { "date": "2024-05-01", "testament": "new", "book": "Mark", "chapter": 4 },
                { "date": "2024-05-02", "testament": "new", "book": "Mark", "chapter": 5 }
            ]
        }))
        .await
        .unwrap();

    assert_eq!(report.inserted_count, 1);
    assert_eq!(report.updated_count, 1);
    assert_eq!(report.failed_count, 0);

    let updated = db.find_plan_by_date(date("2024-05-01")).await.unwrap().unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.testament, Testament::New);
    assert_eq!(updated.book, "Mark");
    assert_eq!(updated.chapter, 4);
}

#[tokio::test]
async fn repeated_date_in_one_batch_inserts_then_updates() {
    let (db, service) = setup();

    let report = service
        .bulk_import(&json!({
            "entries": [
                { "date": "2024-06-01", "testament": "old", "book": "Job", "chapter": 1 },
                { "date": "2024-06-01", "testament": "old", "book": "Job", "chapter": 2 }
            ]
        }))
        .await
        .unwrap();

    assert_eq!((report.inserted_count, report.updated_count), (1, 1));
    let plans = db.plans();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].chapter, 2);
}

#[tokio::test]
async fn a_failed_write_rolls_back_the_whole_batch() {
    let (db, service) = setup();
    db.fail_import_write_at(1);

    let result = service
        .bulk_import(&json!({
            "entries": [
                { "date": "2024-07-01", "testament": "new", "book": "Acts", "chapter": 1 },
                { "date": "2024-07-02", "testament": "new", "book": "Acts", "chapter": 2 }
            ]
        }))
        .await;

    assert!(matches!(result, Err(ServiceError::Internal(_))));
    assert!(db.plans().is_empty());
}

#[tokio::test]
async fn a_date_taken_mid_import_is_a_duplicate_and_rolls_back() {
    let (db, service) = setup();
    db.conflict_import_write_at(1);

    let err = service
        .bulk_import(&json!({
            "entries": [
                { "date": "2024-07-10", "testament": "new", "book": "Acts", "chapter": 10 },
                { "date": "2024-07-11", "testament": "new", "book": "Acts", "chapter": 11 }
            ]
        }))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "DUPLICATE_DATE");
    assert!(db.plans().is_empty());
}

#[tokio::test]
async fn non_object_entries_fail_individually() {
    let (db, service) = setup();

    let report = service
        .bulk_import(&json!({
            "entries": [
                "2024-08-01",
                { "date": "2024-08-02", "testament": "new", "book": "Romans", "chapter": 8 },
                null
            ]
        }))
        .await
        .unwrap();

    assert_eq!(report.inserted_count, 1);
    let indices: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(indices, [0, 2]);
    assert_eq!(report.failures[0].issues[0].field, "entry");
    assert_eq!(db.plans().len(), 1);
}

#[tokio::test]
async fn entries_must_be_an_array() {
    let (_db, service) = setup();

    for payload in [json!({}), json!({ "entries": {} }), json!([])] {
        match service.bulk_import(&payload).await {
            Err(ServiceError::Validation(issues)) => assert_eq!(issues[0].field, "entries"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn all_invalid_batch_touches_nothing() {
    let (db, service) = setup();

    let report = service
        .bulk_import(&json!({ "entries": [{ "date": "2024-02-30" }] }))
        .await
        .unwrap();

    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failures[0].issues.len(), 4);
    assert!(db.plans().is_empty());
}

#[tokio::test]
async fn single_create_reports_duplicate_date() {
    let (_db, service) = setup();
    let entry = json!({ "date": "2024-09-09", "testament": "old", "book": "Isaiah", "chapter": 9 });

    service.create(&entry).await.unwrap();
    let err = service.create(&entry).await.unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_DATE");
}

#[tokio::test]
async fn update_checks_id_then_existence_then_body() {
    let (db, service) = setup();
    let first = service
        .create(&json!({ "date": "2024-10-01", "testament": "old", "book": "Daniel", "chapter": 1 }))
        .await
        .unwrap();
    service
        .create(&json!({ "date": "2024-10-02", "testament": "old", "book": "Daniel", "chapter": 2 }))
        .await
        .unwrap();

    let err = service.update("abc", &json!({})).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref issues) if issues[0].field == "id"));

    let err = service.update("9999", &json!({})).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let err = service.update(&first.id.to_string(), &json!({})).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let err = service
        .update(
            &first.id.to_string(),
            &json!({ "date": "2024-10-02", "testament": "old", "book": "Daniel", "chapter": 3 }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_DATE");

    service
        .update(
            &first.id.to_string(),
            &json!({ "date": "2024-10-05", "testament": "old", "book": "Daniel", "chapter": 5 }),
        )
        .await
        .unwrap();
    let moved = db.find_plan_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(moved.date, date("2024-10-05"));
}

#[tokio::test]
async fn delete_reports_missing_plans() {
    let (_db, service) = setup();
    let plan = service
        .create(&json!({ "date": "2024-11-11", "testament": "new", "book": "Jude", "chapter": 1 }))
        .await
        .unwrap();

    service.delete(&plan.id.to_string()).await.unwrap();
    let err = service.delete(&plan.id.to_string()).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}
