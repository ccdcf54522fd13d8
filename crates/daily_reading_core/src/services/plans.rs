//! Reading-plan administration and the bulk importer.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::dates::{DateWindow, RangeQuery};
use crate::domain::{PlanEntry, ReadingPlan};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{DatabaseService, PortError};
use crate::validation::{decode_object, positive_param, validate_plan_entry, FieldIssue, RawPlanEntry};

/// Body of `POST /admin/plans/bulk-import`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBulkImport {
    pub entries: Value,
}

/// An entry that failed validation, keyed by its position in the submitted array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub index: usize,
    pub issues: Vec<FieldIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub inserted_count: usize,
    pub updated_count: usize,
    pub failed_count: usize,
    pub failures: Vec<ImportFailure>,
}

#[derive(Clone)]
pub struct PlanService {
    db: Arc<dyn DatabaseService>,
}

impl PlanService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn for_date(&self, date: NaiveDate) -> ServiceResult<Option<ReadingPlan>> {
        Ok(self.db.find_plan_by_date(date).await?)
    }

    pub async fn list(&self, query: &RangeQuery) -> ServiceResult<Vec<ReadingPlan>> {
        let window = DateWindow::from_query(query)?;
        Ok(self.db.list_plans(window).await?)
    }

    /// Creates a single plan. A taken date surfaces as `DUPLICATE_DATE`.
    pub async fn create(&self, payload: &Value) -> ServiceResult<ReadingPlan> {
        let raw: RawPlanEntry = decode_object(payload);
        let entry = validate_plan_entry(&raw)?;

        let plan = self.db.insert_plan(&entry).await.map_err(duplicate_date)?;
        info!(plan_id = plan.id, date = %plan.date, "Reading plan created");
        Ok(plan)
    }

    /// Rewrites an existing plan, its date included.
    pub async fn update(&self, raw_id: &str, payload: &Value) -> ServiceResult<()> {
        let plan_id = parse_plan_id(raw_id)?;

        if self.db.find_plan_by_id(plan_id).await?.is_none() {
            return Err(plan_missing());
        }

        let raw: RawPlanEntry = decode_object(payload);
        let entry = validate_plan_entry(&raw)?;

        self.db
            .update_plan(plan_id, &entry)
            .await
            .map_err(duplicate_date)?;
        info!(plan_id, date = %entry.date, "Reading plan updated");
        Ok(())
    }

    pub async fn delete(&self, raw_id: &str) -> ServiceResult<()> {
        let plan_id = parse_plan_id(raw_id)?;

        if !self.db.delete_plan(plan_id).await? {
            return Err(plan_missing());
        }
        info!(plan_id, "Reading plan deleted");
        Ok(())
    }

    /// Validates every entry, then upserts the valid ones by date in one transaction.
    ///
    /// Invalid entries are reported with their original index and never reach
    /// the store. If any write fails, none of the valid entries are kept.
    pub async fn bulk_import(&self, payload: &Value) -> ServiceResult<ImportReport> {
        let raw: RawBulkImport = decode_object(payload);
        let Value::Array(entries) = &raw.entries else {
            return Err(ServiceError::validation("entries", "Must be an array"));
        };

        let mut failures = Vec::new();
        let mut valid: Vec<PlanEntry> = Vec::with_capacity(entries.len());

        for (index, value) in entries.iter().enumerate() {
            let checked = RawPlanEntry::from_json(value)
                .map_err(|issue| vec![issue])
                .and_then(|raw| validate_plan_entry(&raw));

            match checked {
                Ok(entry) => valid.push(entry),
                Err(issues) => failures.push(ImportFailure { index, issues }),
            }
        }

        let mut report = ImportReport {
            failed_count: failures.len(),
            failures,
            ..ImportReport::default()
        };

        if valid.is_empty() {
            debug!(failed = report.failed_count, "Bulk import had no valid entries");
            return Ok(report);
        }

        let mut tx = self.db.begin_plan_import().await?;
        for entry in &valid {
            match tx.find_plan_id_by_date(entry.date).await? {
                None => {
                    tx.insert_plan(entry).await.map_err(duplicate_date)?;
                    report.inserted_count += 1;
                }
                Some(plan_id) => {
                    tx.update_plan_content(plan_id, entry).await?;
                    report.updated_count += 1;
                }
            }
        }
        tx.commit().await?;

        info!(
            inserted = report.inserted_count,
            updated = report.updated_count,
            failed = report.failed_count,
            "Bulk plan import committed"
        );
        Ok(report)
    }
}

fn parse_plan_id(raw_id: &str) -> ServiceResult<i64> {
    positive_param(raw_id).ok_or_else(|| ServiceError::validation("id", "Must be a positive integer"))
}

fn plan_missing() -> ServiceError {
    ServiceError::NotFound {
        code: "NOT_FOUND",
        message: "Reading plan not found.",
    }
}

fn duplicate_date(error: PortError) -> ServiceError {
    match error {
        PortError::Conflict(_) => ServiceError::duplicate_date(),
        other => other.into(),
    }
}
