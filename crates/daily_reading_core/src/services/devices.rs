use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::domain::Platform;
use crate::error::ServiceResult;
use crate::ports::DatabaseService;
use crate::validation::{decode_object, loose_text, Issues};

const MAX_TOKEN_CHARS: usize = 255;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDevice {
    pub push_token: Value,
    pub platform: Value,
}

#[derive(Clone)]
pub struct DeviceService {
    db: Arc<dyn DatabaseService>,
}

impl DeviceService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn register(&self, user_id: i64, payload: &Value) -> ServiceResult<()> {
        let raw: RawDevice = decode_object(payload);
        let push_token = loose_text(&raw.push_token);
        let platform_text = loose_text(&raw.platform);

        let mut issues = Issues::default();
        check_token(&push_token, &mut issues);

        let platform = Platform::parse(&platform_text);
        if platform_text.is_empty() {
            issues.push("platform", "Platform is required");
        } else if platform.is_none() {
            issues.push("platform", "Must be one of: android, ios, web");
        }

        let Some(platform) = platform.filter(|_| issues.is_empty()) else {
            return Err(issues.into_vec().into());
        };

        self.db.upsert_device(user_id, &push_token, platform).await?;
        info!(user_id, platform = platform.as_str(), "Device registered");
        Ok(())
    }

    /// Removes the token only if it belongs to the caller.
    pub async fn unregister(&self, user_id: i64, payload: &Value) -> ServiceResult<()> {
        let raw: RawDevice = decode_object(payload);
        let push_token = loose_text(&raw.push_token);

        let mut issues = Issues::default();
        check_token(&push_token, &mut issues);
        if !issues.is_empty() {
            return Err(issues.into_vec().into());
        }

        self.db.delete_device(user_id, &push_token).await?;
        info!(user_id, "Device unregistered");
        Ok(())
    }
}

fn check_token(push_token: &str, issues: &mut Issues) {
    if push_token.is_empty() {
        issues.push("pushToken", "Push token is required");
    } else if push_token.chars().count() > MAX_TOKEN_CHARS {
        issues.push("pushToken", "Must be at most 255 characters");
    }
}
