//! Saved verse references.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::dates::{parse_calendar_date, DATE_ISSUE};
use crate::domain::{NewSavedVerse, SavedVerse};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::DatabaseService;
use crate::validation::{decode_object, loose_text, positive_param, Issues};

pub const MAX_REFERENCE_CHARS: usize = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawVerse {
    pub date: Value,
    pub reference_text: Value,
    pub note: Value,
}

/// Raw `page`/`pageSize` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersePage {
    pub items: Vec<SavedVerse>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[derive(Clone)]
pub struct VerseService {
    db: Arc<dyn DatabaseService>,
}

impl VerseService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Saves a reference, linking it to the plan of `date` when one exists.
    pub async fn create(&self, user_id: i64, payload: &Value) -> ServiceResult<SavedVerse> {
        let raw: RawVerse = decode_object(payload);
        let date_text = loose_text(&raw.date);
        let reference_text = loose_text(&raw.reference_text);

        let mut issues = Issues::default();
        let date = if date_text.is_empty() {
            None
        } else {
            let parsed = parse_calendar_date(&date_text);
            if parsed.is_none() {
                issues.push("date", DATE_ISSUE);
            }
            parsed
        };

        if reference_text.is_empty() {
            issues.push("referenceText", "Reference text is required");
        } else if reference_text.chars().count() > MAX_REFERENCE_CHARS {
            issues.push("referenceText", "Must be at most 100 characters");
        }

        let note = match &raw.note {
            Value::Null => None,
            Value::String(note) => Some(note.clone()),
            _ => {
                issues.push("note", "Must be a string");
                None
            }
        };

        if !issues.is_empty() {
            return Err(issues.into_vec().into());
        }

        let plan_id = match date {
            Some(date) => self.db.find_plan_by_date(date).await?.map(|plan| plan.id),
            None => None,
        };

        let verse = self
            .db
            .insert_saved_verse(&NewSavedVerse {
                user_id,
                plan_id,
                reference_text,
                note,
            })
            .await?;
        info!(user_id, verse_id = verse.id, "Verse saved");
        Ok(verse)
    }

    pub async fn list(&self, user_id: i64, query: &PageQuery) -> ServiceResult<VersePage> {
        let page = query.page.as_deref().map_or(Some(1), positive_param);
        let page_size = query
            .page_size
            .as_deref()
            .map_or(Some(DEFAULT_PAGE_SIZE), positive_param);

        let mut issues = Issues::default();
        if page.is_none() {
            issues.push("page", "Must be a positive integer");
        }
        if page_size.is_none() {
            issues.push("pageSize", "Must be a positive integer");
        }
        let (Some(page), Some(page_size)) = (page, page_size) else {
            return Err(issues.into_vec().into());
        };

        let offset = (page - 1).saturating_mul(page_size);
        let items = self.db.list_saved_verses(user_id, page_size, offset).await?;
        let total = self.db.count_saved_verses(user_id).await?;

        Ok(VersePage {
            items,
            page,
            page_size,
            total,
        })
    }

    /// Deletes one of the caller's own verses.
    pub async fn delete(&self, user_id: i64, raw_id: &str) -> ServiceResult<()> {
        let verse_id = positive_param(raw_id)
            .ok_or_else(|| ServiceError::validation("id", "Must be a positive integer"))?;

        if !self.db.delete_saved_verse(verse_id, user_id).await? {
            return Err(ServiceError::NotFound {
                code: "NOT_FOUND",
                message: "Saved verse not found.",
            });
        }
        Ok(())
    }
}
