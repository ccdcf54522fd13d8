//! Daily completion and reading history.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::dates::{parse_calendar_date, DateWindow, RangeQuery, DATE_ISSUE};
use crate::domain::{ReadingMethod, ReadingPlan, ReadingRecord};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{DatabaseService, PortError};
use crate::streak;
use crate::validation::{decode_object, loose_text, Issues};

/// Body of `POST /reading/complete`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCompletion {
    pub date: Value,
    pub method: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub completed_count: usize,
    pub missed_count: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Plans, completions and derived streaks for one user over one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistory {
    pub plans: Vec<ReadingPlan>,
    pub records: Vec<ReadingRecord>,
    pub missed_dates: Vec<NaiveDate>,
    pub summary: HistorySummary,
}

#[derive(Clone)]
pub struct ReadingService {
    db: Arc<dyn DatabaseService>,
}

impl ReadingService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Marks the plan of `date` as read by the user.
    ///
    /// Completing the same plan again is a no-op: the first record, with its
    /// original method and timestamp, is returned unchanged.
    pub async fn complete(&self, user_id: i64, payload: &Value) -> ServiceResult<ReadingRecord> {
        let raw: RawCompletion = decode_object(payload);
        let date = parse_calendar_date(&loose_text(&raw.date));
        let method = ReadingMethod::parse(&loose_text(&raw.method));

        let mut issues = Issues::default();
        if date.is_none() {
            issues.push("date", DATE_ISSUE);
        }
        if method.is_none() {
            issues.push("method", "Must be one of: physical, digital");
        }
        let (Some(date), Some(method)) = (date, method) else {
            return Err(issues.into_vec().into());
        };

        let plan = self
            .db
            .find_plan_by_date(date)
            .await?
            .ok_or_else(ServiceError::plan_not_found)?;

        match self.db.insert_reading_record(user_id, plan.id, method).await {
            Ok(()) => info!(user_id, plan_id = plan.id, method = method.as_str(), "Reading completed"),
            Err(PortError::Conflict(_)) => {
                debug!(user_id, plan_id = plan.id, "Reading already completed; keeping first record")
            }
            Err(e) => return Err(e.into()),
        }

        self.db
            .find_reading_record(user_id, plan.id)
            .await?
            .ok_or_else(|| ServiceError::Internal("Unable to load reading record.".to_string()))
    }

    /// Joins the window's plans with the user's completions.
    ///
    /// Streaks only consider dates that have a plan inside the window, so the
    /// same user can get different streaks for different windows.
    pub async fn history(&self, user_id: i64, query: &RangeQuery) -> ServiceResult<ReadingHistory> {
        let window = DateWindow::from_query(query)?;

        let plans = self.db.list_plans(window).await?;
        let records = self.db.list_reading_records(user_id, window).await?;

        let completed: HashSet<NaiveDate> = records.iter().map(|record| record.date).collect();
        let ordered_dates: Vec<NaiveDate> = plans.iter().map(|plan| plan.date).collect();
        let missed_dates: Vec<NaiveDate> = ordered_dates
            .iter()
            .copied()
            .filter(|date| !completed.contains(date))
            .collect();

        let streaks = streak::calculate(&ordered_dates, &completed);
        let summary = HistorySummary {
            completed_count: completed.len(),
            missed_count: missed_dates.len(),
            current_streak: streaks.current_streak,
            longest_streak: streaks.longest_streak,
        };

        Ok(ReadingHistory {
            plans,
            records,
            missed_dates,
            summary,
        })
    }
}
