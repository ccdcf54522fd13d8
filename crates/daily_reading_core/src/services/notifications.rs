//! The daily "today's reading is ready" push run.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::NotificationLogEntry;
use crate::error::ServiceResult;
use crate::ports::{DatabaseService, NotificationProvider, PushMessage};

pub const REMINDER_TITLE: &str = "Today's reading is ready";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRunReport {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<i64>,
    pub sent_count: usize,
    pub user_count: usize,
    pub token_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<dyn DatabaseService>,
    provider: Arc<dyn NotificationProvider>,
}

impl NotificationService {
    pub fn new(db: Arc<dyn DatabaseService>, provider: Arc<dyn NotificationProvider>) -> Self {
        Self { db, provider }
    }

    /// Reminds every user with a registered device who has not read `today`'s plan.
    ///
    /// Each run appends one row to the notification log. That write happens
    /// after the sends and a failure there is logged, not returned.
    pub async fn send_today(&self, today: NaiveDate) -> ServiceResult<NotificationRunReport> {
        let Some(plan) = self.db.find_plan_by_date(today).await? else {
            info!(date = %today, "No reading plan for today; nothing to send");
            self.write_log(today, 0, json!({ "reason": "NO_PLAN_FOR_TODAY" })).await;
            return Ok(NotificationRunReport {
                date: today,
                plan_id: None,
                sent_count: 0,
                user_count: 0,
                token_count: 0,
                reason: Some("No reading plan for today.".to_string()),
                mode: None,
            });
        };

        let body = format!(
            "{} {} — chapter {}",
            plan.testament.as_str(),
            plan.book,
            plan.chapter
        );

        let mut sent_count = 0;
        let mut user_count = 0;
        let mut token_count = 0;

        for recipient in self.db.pending_recipients(plan.id).await? {
            let tokens: Vec<String> = recipient
                .tokens
                .into_iter()
                .filter(|token| !token.is_empty())
                .collect();
            if tokens.is_empty() {
                continue;
            }

            token_count += tokens.len();
            user_count += 1;

            let message = PushMessage {
                tokens,
                title: REMINDER_TITLE.to_string(),
                body: body.clone(),
                data: json!({
                    "planId": plan.id,
                    "date": today,
                    "userId": recipient.user_id,
                }),
            };
            sent_count += self.provider.send(&message).await?;
        }

        let mode = self.provider.mode();
        self.write_log(
            today,
            sent_count,
            json!({
                "planId": plan.id,
                "userCount": user_count,
                "tokenCount": token_count,
                "mode": mode,
            }),
        )
        .await;

        info!(date = %today, plan_id = plan.id, sent_count, user_count, token_count, "Daily reminders sent");
        Ok(NotificationRunReport {
            date: today,
            plan_id: Some(plan.id),
            sent_count,
            user_count,
            token_count,
            reason: None,
            mode: Some(mode.to_string()),
        })
    }

    async fn write_log(&self, run_date: NaiveDate, sent_count: usize, details: serde_json::Value) {
        let entry = NotificationLogEntry {
            run_date,
            sent_count: sent_count as i64,
            details,
        };
        if let Err(e) = self.db.insert_notification_log(&entry).await {
            warn!("Failed to write notification log for {}: {:?}", run_date, e);
        }
    }
}
