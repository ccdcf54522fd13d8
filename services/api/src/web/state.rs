//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use chrono::Duration;
use daily_reading_core::ports::{CredentialHasher, DatabaseService, NotificationProvider};
use daily_reading_core::services::{
    AccountService, AnnouncementService, DeviceService, NotificationService, PlanService,
    ReadingService, VerseService,
};

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub accounts: AccountService,
    pub plans: PlanService,
    pub reading: ReadingService,
    pub verses: VerseService,
    pub devices: DeviceService,
    pub announcements: AnnouncementService,
    pub notifications: NotificationService,
}

impl AppState {
    /// Wires every application service to the same store.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        provider: Arc<dyn NotificationProvider>,
        hasher: Arc<dyn CredentialHasher>,
        config: Arc<Config>,
    ) -> Self {
        let session_ttl = Duration::days(config.session_ttl_days);
        Self {
            accounts: AccountService::new(db.clone(), hasher, session_ttl),
            plans: PlanService::new(db.clone()),
            reading: ReadingService::new(db.clone()),
            verses: VerseService::new(db.clone()),
            devices: DeviceService::new(db.clone()),
            announcements: AnnouncementService::new(db.clone()),
            notifications: NotificationService::new(db.clone(), provider),
            db,
            config,
        }
    }
}
