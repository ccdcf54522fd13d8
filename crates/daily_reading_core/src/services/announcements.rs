use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::domain::Announcement;
use crate::error::ServiceResult;
use crate::ports::DatabaseService;
use crate::services::verses::PageQuery;
use crate::validation::{decode_object, loose_text, positive_param, Issues};

const MAX_TITLE_CHARS: usize = 140;
const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAnnouncement {
    pub title: Value,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementPage {
    pub announcements: Vec<Announcement>,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Clone)]
pub struct AnnouncementService {
    db: Arc<dyn DatabaseService>,
}

impl AnnouncementService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create(&self, author_id: i64, payload: &Value) -> ServiceResult<Announcement> {
        let raw: RawAnnouncement = decode_object(payload);
        let title = loose_text(&raw.title);
        let body = loose_text(&raw.body);

        let mut issues = Issues::default();
        if title.is_empty() {
            issues.push("title", "Title is required");
        } else if title.chars().count() > MAX_TITLE_CHARS {
            issues.push("title", "Title must be 140 characters or fewer");
        }
        if body.is_empty() {
            issues.push("body", "Body is required");
        }
        if !issues.is_empty() {
            return Err(issues.into_vec().into());
        }

        let announcement = self.db.insert_announcement(&title, &body, author_id).await?;
        info!(announcement_id = announcement.id, "Announcement published");
        Ok(announcement)
    }

    /// Lenient paging: a bad page falls back to 1, a bad or oversized page size to 50.
    pub async fn list(&self, query: &PageQuery) -> ServiceResult<AnnouncementPage> {
        let page = query.page.as_deref().and_then(positive_param).unwrap_or(1);
        let page_size = query
            .page_size
            .as_deref()
            .and_then(positive_param)
            .filter(|size| *size <= MAX_PAGE_SIZE)
            .unwrap_or(MAX_PAGE_SIZE);

        let offset = (page - 1).saturating_mul(page_size);
        let announcements = self.db.list_announcements(page_size, offset).await?;

        Ok(AnnouncementPage {
            announcements,
            page,
            page_size,
        })
    }
}
