//! services/api/src/adapters/notifications.rs
//!
//! A `NotificationProvider` that records each push as one JSON line in a log
//! file instead of calling a push gateway.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use daily_reading_core::ports::{NotificationProvider, PortError, PortResult, PushMessage};
use serde_json::json;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct LogNotificationProvider {
    path: PathBuf,
}

impl LogNotificationProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl NotificationProvider for LogNotificationProvider {
    async fn send(&self, message: &PushMessage) -> PortResult<usize> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| PortError::Unexpected(format!("notification log dir: {}", e)))?;
        }

        let line = json!({
            "at": Utc::now().to_rfc3339(),
            "tokens": message.tokens,
            "title": message.title,
            "body": message.body,
            "data": message.data,
        });

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PortError::Unexpected(format!("notification log open: {}", e)))?;
        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| PortError::Unexpected(format!("notification log write: {}", e)))?;

        debug!(tokens = message.tokens.len(), "Push logged");
        Ok(message.tokens.len())
    }

    fn mode(&self) -> &'static str {
        "log"
    }
}
