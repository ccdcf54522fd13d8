//! crates/daily_reading_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the relational store and of the push delivery channel.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::dates::DateWindow;
use crate::domain::{
    Announcement, AuthSession, NewSavedVerse, NotificationLogEntry, PendingRecipient, Platform,
    PlanEntry, ReadingMethod, ReadingPlan, ReadingRecord, Role, SavedVerse, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    /// Round-trips a trivial statement to prove the store is reachable.
    async fn ping(&self) -> PortResult<()>;

    // --- Users ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: i64) -> PortResult<Option<User>>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    // --- Auth Sessions ---
    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()>;

    /// Returns the owning user id when the token exists and has not expired at `now`.
    async fn resolve_auth_session(&self, token: &str, now: DateTime<Utc>)
        -> PortResult<Option<i64>>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    // --- Reading Plans ---
    async fn find_plan_by_date(&self, date: NaiveDate) -> PortResult<Option<ReadingPlan>>;

    async fn find_plan_by_id(&self, plan_id: i64) -> PortResult<Option<ReadingPlan>>;

    /// Plans whose date falls inside the window, ascending by date.
    async fn list_plans(&self, window: DateWindow) -> PortResult<Vec<ReadingPlan>>;

    /// Fails with `Conflict` when a plan already exists for the entry's date.
    async fn insert_plan(&self, entry: &PlanEntry) -> PortResult<ReadingPlan>;

    /// Rewrites every column of an existing plan, the date included.
    /// Fails with `Conflict` when the new date belongs to another plan.
    async fn update_plan(&self, plan_id: i64, entry: &PlanEntry) -> PortResult<()>;

    /// Returns `false` when no plan had that id.
    async fn delete_plan(&self, plan_id: i64) -> PortResult<bool>;

    /// Opens the scoped transaction used by the bulk importer.
    async fn begin_plan_import(&self) -> PortResult<Box<dyn PlanImportTransaction>>;

    // --- Reading Records ---
    /// Fails with `Conflict` when the user already completed this plan.
    async fn insert_reading_record(
        &self,
        user_id: i64,
        plan_id: i64,
        method: ReadingMethod,
    ) -> PortResult<()>;

    async fn find_reading_record(
        &self,
        user_id: i64,
        plan_id: i64,
    ) -> PortResult<Option<ReadingRecord>>;

    /// The user's records whose plan date falls in the window,
    /// ascending by plan date then by record id.
    async fn list_reading_records(
        &self,
        user_id: i64,
        window: DateWindow,
    ) -> PortResult<Vec<ReadingRecord>>;

    // --- Saved Verses ---
    async fn insert_saved_verse(&self, verse: &NewSavedVerse) -> PortResult<SavedVerse>;

    /// Newest first.
    async fn list_saved_verses(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> PortResult<Vec<SavedVerse>>;

    async fn count_saved_verses(&self, user_id: i64) -> PortResult<i64>;

    /// Deletes only when the verse belongs to `user_id`; returns whether a row went away.
    async fn delete_saved_verse(&self, verse_id: i64, user_id: i64) -> PortResult<bool>;

    // --- Devices ---
    /// Registers the token for the user, taking it over if another user held it.
    async fn upsert_device(&self, user_id: i64, push_token: &str, platform: Platform)
        -> PortResult<()>;

    async fn delete_device(&self, user_id: i64, push_token: &str) -> PortResult<()>;

    // --- Announcements ---
    async fn insert_announcement(
        &self,
        title: &str,
        body: &str,
        created_by: i64,
    ) -> PortResult<Announcement>;

    /// Newest first.
    async fn list_announcements(&self, limit: i64, offset: i64) -> PortResult<Vec<Announcement>>;

    // --- Notifications ---
    /// Users with at least one device who have no reading record for the plan.
    async fn pending_recipients(&self, plan_id: i64) -> PortResult<Vec<PendingRecipient>>;

    async fn insert_notification_log(&self, entry: &NotificationLogEntry) -> PortResult<()>;
}

/// A store transaction scoped to one bulk import.
///
/// Nothing is visible to other readers until `commit` succeeds. Dropping the
/// transaction without committing rolls every statement back.
#[async_trait]
pub trait PlanImportTransaction: Send {
    async fn find_plan_id_by_date(&mut self, date: NaiveDate) -> PortResult<Option<i64>>;

    async fn insert_plan(&mut self, entry: &PlanEntry) -> PortResult<()>;

    /// Updates testament, book and chapter; the date is the lookup key and stays put.
    async fn update_plan_content(&mut self, plan_id: i64, entry: &PlanEntry) -> PortResult<()>;

    async fn commit(self: Box<Self>) -> PortResult<()>;
}

/// A push message fanned out to every token of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Delivers the message and reports how many tokens accepted it.
    async fn send(&self, message: &PushMessage) -> PortResult<usize>;

    /// Short label recorded in the notification log (e.g. `"log"`).
    fn mode(&self) -> &'static str;
}

/// One-way password hashing.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
    fn verify(&self, password: &str, password_hash: &str) -> PortResult<bool>;
}
