//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use daily_reading_core::dates::DateWindow;
use daily_reading_core::domain::{
    Announcement, AuthSession, NewSavedVerse, NotificationLogEntry, PendingRecipient, Platform,
    PlanEntry, ReadingMethod, ReadingPlan, ReadingRecord, Role, SavedVerse, Testament, User,
    UserCredentials,
};
use daily_reading_core::ports::{DatabaseService, PlanImportTransaction, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;

/// Advisory lock key held for the lifetime of every bulk import transaction.
const PLAN_IMPORT_LOCK_KEY: i64 = 0x0D41_1E5E;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Unique-constraint violations become `Conflict`; anything else is unexpected.
fn conflict_or_unexpected(e: sqlx::Error, what: &str) -> PortError {
    let is_unique = e
        .as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation());
    if is_unique {
        PortError::Conflict(what.to_string())
    } else {
        unexpected(e)
    }
}

fn bad_column(column: &str, value: &str) -> PortError {
    PortError::Unexpected(format!("unexpected {} value in store: '{}'", column, value))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    email: String,
    name: Option<String>,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = Role::parse(&self.role).ok_or_else(|| bad_column("role", &self.role))?;
        Ok(User {
            id: self.id,
            email: self.email,
            name: self.name,
            role,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    #[sqlx(flatten)]
    user: UserRecord,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        Ok(UserCredentials {
            user: self.user.to_domain()?,
            password_hash: self.password_hash,
        })
    }
}

#[derive(FromRow)]
struct PlanRecord {
    id: i64,
    date: NaiveDate,
    testament: String,
    book: String,
    chapter: i32,
    created_at: DateTime<Utc>,
}
impl PlanRecord {
    fn to_domain(self) -> PortResult<ReadingPlan> {
        let testament = Testament::parse(&self.testament)
            .ok_or_else(|| bad_column("testament", &self.testament))?;
        Ok(ReadingPlan {
            id: self.id,
            date: self.date,
            testament,
            book: self.book,
            chapter: self.chapter,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ReadingRecordRow {
    id: i64,
    user_id: i64,
    plan_id: i64,
    method: String,
    completed_at: DateTime<Utc>,
    date: NaiveDate,
}
impl ReadingRecordRow {
    fn to_domain(self) -> PortResult<ReadingRecord> {
        let method =
            ReadingMethod::parse(&self.method).ok_or_else(|| bad_column("method", &self.method))?;
        Ok(ReadingRecord {
            id: self.id,
            user_id: self.user_id,
            plan_id: self.plan_id,
            method,
            completed_at: self.completed_at,
            date: self.date,
        })
    }
}

#[derive(FromRow)]
struct SavedVerseRecord {
    id: i64,
    user_id: i64,
    plan_id: Option<i64>,
    reference_text: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
}
impl SavedVerseRecord {
    fn to_domain(self) -> SavedVerse {
        SavedVerse {
            id: self.id,
            user_id: self.user_id,
            plan_id: self.plan_id,
            reference_text: self.reference_text,
            note: self.note,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AnnouncementRecord {
    id: i64,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    created_by: i64,
}
impl AnnouncementRecord {
    fn to_domain(self) -> Announcement {
        Announcement {
            id: self.id,
            title: self.title,
            body: self.body,
            created_at: self.created_at,
            created_by: self.created_by,
        }
    }
}

#[derive(FromRow)]
struct RecipientRecord {
    user_id: i64,
    tokens: Vec<String>,
}

fn plans_to_domain(records: Vec<PlanRecord>) -> PortResult<Vec<ReadingPlan>> {
    records.into_iter().map(PlanRecord::to_domain).collect()
}

const PLAN_COLUMNS: &str = "id, date, testament, book, chapter, created_at";
const VERSE_COLUMNS: &str = "id, user_id, plan_id, reference_text, note, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Users ---

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, password_hash, name, role) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, name, role",
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "email is already registered"))?;

        record.to_domain()
    }

    async fn get_user_by_id(&self, user_id: i64) -> PortResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(UserRecord::to_domain)
            .transpose()
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, name, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(CredentialsRecord::to_domain)
        .transpose()
    }

    // --- Auth Sessions ---

    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn resolve_auth_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM auth_sessions WHERE token = $1 AND expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Reading Plans ---

    async fn find_plan_by_date(&self, date: NaiveDate) -> PortResult<Option<ReadingPlan>> {
        sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {PLAN_COLUMNS} FROM reading_plan WHERE date = $1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(PlanRecord::to_domain)
        .transpose()
    }

    async fn find_plan_by_id(&self, plan_id: i64) -> PortResult<Option<ReadingPlan>> {
        sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {PLAN_COLUMNS} FROM reading_plan WHERE id = $1"
        ))
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(PlanRecord::to_domain)
        .transpose()
    }

    async fn list_plans(&self, window: DateWindow) -> PortResult<Vec<ReadingPlan>> {
        let records = sqlx::query_as::<_, PlanRecord>(&format!(
            "SELECT {PLAN_COLUMNS} FROM reading_plan WHERE date BETWEEN $1 AND $2 ORDER BY date ASC"
        ))
        .bind(window.from())
        .bind(window.to())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        plans_to_domain(records)
    }

    async fn insert_plan(&self, entry: &PlanEntry) -> PortResult<ReadingPlan> {
        sqlx::query_as::<_, PlanRecord>(&format!(
            "INSERT INTO reading_plan (date, testament, book, chapter) VALUES ($1, $2, $3, $4) \
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(entry.date)
        .bind(entry.testament.as_str())
        .bind(&entry.book)
        .bind(entry.chapter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "plan date is taken"))?
        .to_domain()
    }

    async fn update_plan(&self, plan_id: i64, entry: &PlanEntry) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE reading_plan SET date = $1, testament = $2, book = $3, chapter = $4 WHERE id = $5",
        )
        .bind(entry.date)
        .bind(entry.testament.as_str())
        .bind(&entry.book)
        .bind(entry.chapter)
        .bind(plan_id)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_unexpected(e, "plan date is taken"))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Plan {} not found", plan_id)));
        }
        Ok(())
    }

    async fn delete_plan(&self, plan_id: i64) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM reading_plan WHERE id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn begin_plan_import(&self) -> PortResult<Box<dyn PlanImportTransaction>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Serializes overlapping imports; released on commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(PLAN_IMPORT_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        debug!("Plan import transaction opened");

        Ok(Box::new(PgPlanImport { tx }))
    }

    // --- Reading Records ---

    async fn insert_reading_record(
        &self,
        user_id: i64,
        plan_id: i64,
        method: ReadingMethod,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO reading_records (user_id, plan_id, method) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(plan_id)
            .bind(method.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_or_unexpected(e, "plan already completed"))?;
        Ok(())
    }

    async fn find_reading_record(
        &self,
        user_id: i64,
        plan_id: i64,
    ) -> PortResult<Option<ReadingRecord>> {
        sqlx::query_as::<_, ReadingRecordRow>(
            "SELECT r.id, r.user_id, r.plan_id, r.method, r.completed_at, p.date \
             FROM reading_records r JOIN reading_plan p ON p.id = r.plan_id \
             WHERE r.user_id = $1 AND r.plan_id = $2",
        )
        .bind(user_id)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(ReadingRecordRow::to_domain)
        .transpose()
    }

    async fn list_reading_records(
        &self,
        user_id: i64,
        window: DateWindow,
    ) -> PortResult<Vec<ReadingRecord>> {
        let rows = sqlx::query_as::<_, ReadingRecordRow>(
            "SELECT r.id, r.user_id, r.plan_id, r.method, r.completed_at, p.date \
             FROM reading_records r JOIN reading_plan p ON p.id = r.plan_id \
             WHERE r.user_id = $1 AND p.date BETWEEN $2 AND $3 \
             ORDER BY p.date ASC, r.id ASC",
        )
        .bind(user_id)
        .bind(window.from())
        .bind(window.to())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows.into_iter().map(ReadingRecordRow::to_domain).collect()
    }

    // --- Saved Verses ---

    async fn insert_saved_verse(&self, verse: &NewSavedVerse) -> PortResult<SavedVerse> {
        let record = sqlx::query_as::<_, SavedVerseRecord>(&format!(
            "INSERT INTO saved_verses (user_id, plan_id, reference_text, note) \
             VALUES ($1, $2, $3, $4) RETURNING {VERSE_COLUMNS}"
        ))
        .bind(verse.user_id)
        .bind(verse.plan_id)
        .bind(&verse.reference_text)
        .bind(&verse.note)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_saved_verses(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> PortResult<Vec<SavedVerse>> {
        let records = sqlx::query_as::<_, SavedVerseRecord>(&format!(
            "SELECT {VERSE_COLUMNS} FROM saved_verses WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_saved_verses(&self, user_id: i64) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM saved_verses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn delete_saved_verse(&self, verse_id: i64, user_id: i64) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM saved_verses WHERE id = $1 AND user_id = $2")
            .bind(verse_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    // --- Devices ---

    async fn upsert_device(
        &self,
        user_id: i64,
        push_token: &str,
        platform: Platform,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_devices (user_id, push_token, platform) VALUES ($1, $2, $3) \
             ON CONFLICT (push_token) DO UPDATE \
             SET user_id = EXCLUDED.user_id, platform = EXCLUDED.platform, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(push_token)
        .bind(platform.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_device(&self, user_id: i64, push_token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM user_devices WHERE user_id = $1 AND push_token = $2")
            .bind(user_id)
            .bind(push_token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Announcements ---

    async fn insert_announcement(
        &self,
        title: &str,
        body: &str,
        created_by: i64,
    ) -> PortResult<Announcement> {
        let record = sqlx::query_as::<_, AnnouncementRecord>(
            "INSERT INTO announcements (title, body, created_by) VALUES ($1, $2, $3) \
             RETURNING id, title, body, created_at, created_by",
        )
        .bind(title)
        .bind(body)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_announcements(&self, limit: i64, offset: i64) -> PortResult<Vec<Announcement>> {
        let records = sqlx::query_as::<_, AnnouncementRecord>(
            "SELECT id, title, body, created_at, created_by FROM announcements \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Notifications ---

    async fn pending_recipients(&self, plan_id: i64) -> PortResult<Vec<PendingRecipient>> {
        let records = sqlx::query_as::<_, RecipientRecord>(
            "SELECT d.user_id, ARRAY_AGG(d.push_token::TEXT ORDER BY d.id) AS tokens \
             FROM user_devices d \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM reading_records r WHERE r.user_id = d.user_id AND r.plan_id = $1 \
             ) \
             GROUP BY d.user_id ORDER BY d.user_id",
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| PendingRecipient {
                user_id: r.user_id,
                tokens: r.tokens,
            })
            .collect())
    }

    async fn insert_notification_log(&self, entry: &NotificationLogEntry) -> PortResult<()> {
        let sent_count = i32::try_from(entry.sent_count).unwrap_or(i32::MAX);
        sqlx::query("INSERT INTO notifications_log (run_date, sent_count, details) VALUES ($1, $2, $3)")
            .bind(entry.run_date)
            .bind(sent_count)
            .bind(&entry.details)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// Bulk Import Transaction
//=========================================================================================

/// Dropping this without `commit` lets sqlx roll the transaction back.
struct PgPlanImport {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PlanImportTransaction for PgPlanImport {
    async fn find_plan_id_by_date(&mut self, date: NaiveDate) -> PortResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM reading_plan WHERE date = $1")
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(unexpected)
    }

    async fn insert_plan(&mut self, entry: &PlanEntry) -> PortResult<()> {
        sqlx::query("INSERT INTO reading_plan (date, testament, book, chapter) VALUES ($1, $2, $3, $4)")
            .bind(entry.date)
            .bind(entry.testament.as_str())
            .bind(&entry.book)
            .bind(entry.chapter)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| conflict_or_unexpected(e, "plan date is taken"))?;
        Ok(())
    }

    async fn update_plan_content(&mut self, plan_id: i64, entry: &PlanEntry) -> PortResult<()> {
        sqlx::query("UPDATE reading_plan SET testament = $1, book = $2, chapter = $3 WHERE id = $4")
            .bind(entry.testament.as_str())
            .bind(&entry.book)
            .bind(entry.chapter)
            .bind(plan_id)
            .execute(&mut *self.tx)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        let PgPlanImport { tx } = *self;
        tx.commit().await.map_err(unexpected)
    }
}
