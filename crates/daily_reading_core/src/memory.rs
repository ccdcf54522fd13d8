//! In-memory implementations of the ports, used by the test suites.
//!
//! Uniqueness rules mirror the relational schema: one plan per date, one
//! reading record per (user, plan), one email per user, one owner per push token.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::dates::DateWindow;
use crate::domain::{
    Announcement, AuthSession, NewSavedVerse, NotificationLogEntry, PendingRecipient, Platform,
    PlanEntry, ReadingMethod, ReadingPlan, ReadingRecord, Role, SavedVerse, User, UserCredentials,
};
use crate::ports::{
    CredentialHasher, DatabaseService, NotificationProvider, PlanImportTransaction, PortError,
    PortResult, PushMessage,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    id: i64,
    user_id: i64,
    plan_id: i64,
    method: ReadingMethod,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredDevice {
    id: i64,
    user_id: i64,
    push_token: String,
    platform: Platform,
}

#[derive(Debug, Clone, Copy)]
enum ImportFault {
    Unexpected,
    /// Behaves as if another writer took the date after the existence check.
    Conflict,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    users: Vec<UserCredentials>,
    sessions: Vec<AuthSession>,
    plans: Vec<ReadingPlan>,
    records: Vec<StoredRecord>,
    verses: Vec<SavedVerse>,
    devices: Vec<StoredDevice>,
    announcements: Vec<Announcement>,
    notification_log: Vec<NotificationLogEntry>,
    /// When set, the n-th write inside an import transaction fails.
    import_fault: Option<(usize, ImportFault)>,
    offline: bool,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_online(&self) -> PortResult<()> {
        if self.offline {
            Err(PortError::Unexpected("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn record_with_date(&self, record: &StoredRecord) -> Option<ReadingRecord> {
        let plan = self.plans.iter().find(|plan| plan.id == record.plan_id)?;
        Some(ReadingRecord {
            id: record.id,
            user_id: record.user_id,
            plan_id: record.plan_id,
            method: record.method,
            completed_at: record.completed_at,
            date: plan.date,
        })
    }
}

fn new_plan(id: i64, entry: &PlanEntry) -> ReadingPlan {
    ReadingPlan {
        id,
        date: entry.date,
        testament: entry.testament,
        book: entry.book.clone(),
        chapter: entry.chapter,
        created_at: Utc::now(),
    }
}

/// A `DatabaseService` backed by plain vectors behind a mutex.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes the `n`-th write (0-based) of every later import transaction fail.
    pub fn fail_import_write_at(&self, n: usize) {
        self.lock().import_fault = Some((n, ImportFault::Unexpected));
    }

    /// Makes the `n`-th import write fail with a uniqueness `Conflict`.
    pub fn conflict_import_write_at(&self, n: usize) {
        self.lock().import_fault = Some((n, ImportFault::Conflict));
    }

    /// Every subsequent call fails with `PortError::Unexpected`.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn plans(&self) -> Vec<ReadingPlan> {
        let mut plans = self.lock().plans.clone();
        plans.sort_by_key(|plan| plan.date);
        plans
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    pub fn notification_log(&self) -> Vec<NotificationLogEntry> {
        self.lock().notification_log.clone()
    }

    pub fn devices_of(&self, user_id: i64) -> Vec<(String, Platform)> {
        self.lock()
            .devices
            .iter()
            .filter(|device| device.user_id == user_id)
            .map(|device| (device.push_token.clone(), device.platform))
            .collect()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn ping(&self) -> PortResult<()> {
        self.lock().check_online()
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
    ) -> PortResult<User> {
        let mut state = self.lock();
        state.check_online()?;
        if state.users.iter().any(|c| c.user.email == email) {
            return Err(PortError::Conflict(format!("email {email} is taken")));
        }
        let user = User {
            id: state.next_id(),
            email: email.to_string(),
            name: Some(name.to_string()),
            role,
        };
        state.users.push(UserCredentials {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: i64) -> PortResult<Option<User>> {
        let state = self.lock();
        state.check_online()?;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone()))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let state = self.lock();
        state.check_online()?;
        Ok(state.users.iter().find(|c| c.user.email == email).cloned())
    }

    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        state.sessions.push(session.clone());
        Ok(())
    }

    async fn resolve_auth_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Option<i64>> {
        let state = self.lock();
        state.check_online()?;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.token == token && s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        state.sessions.retain(|s| s.token != token);
        Ok(())
    }

    async fn find_plan_by_date(&self, date: NaiveDate) -> PortResult<Option<ReadingPlan>> {
        let state = self.lock();
        state.check_online()?;
        Ok(state.plans.iter().find(|p| p.date == date).cloned())
    }

    async fn find_plan_by_id(&self, plan_id: i64) -> PortResult<Option<ReadingPlan>> {
        let state = self.lock();
        state.check_online()?;
        Ok(state.plans.iter().find(|p| p.id == plan_id).cloned())
    }

    async fn list_plans(&self, window: DateWindow) -> PortResult<Vec<ReadingPlan>> {
        let state = self.lock();
        state.check_online()?;
        let mut plans: Vec<ReadingPlan> = state
            .plans
            .iter()
            .filter(|p| window.contains(p.date))
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.date);
        Ok(plans)
    }

    async fn insert_plan(&self, entry: &PlanEntry) -> PortResult<ReadingPlan> {
        let mut state = self.lock();
        state.check_online()?;
        if state.plans.iter().any(|p| p.date == entry.date) {
            return Err(PortError::Conflict(format!("plan date {} is taken", entry.date)));
        }
        let plan = new_plan(state.next_id(), entry);
        state.plans.push(plan.clone());
        Ok(plan)
    }

    async fn update_plan(&self, plan_id: i64, entry: &PlanEntry) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        if state
            .plans
            .iter()
            .any(|p| p.date == entry.date && p.id != plan_id)
        {
            return Err(PortError::Conflict(format!("plan date {} is taken", entry.date)));
        }
        if let Some(plan) = state.plans.iter_mut().find(|p| p.id == plan_id) {
            plan.date = entry.date;
            plan.testament = entry.testament;
            plan.book = entry.book.clone();
            plan.chapter = entry.chapter;
        }
        Ok(())
    }

    async fn delete_plan(&self, plan_id: i64) -> PortResult<bool> {
        let mut state = self.lock();
        state.check_online()?;
        let before = state.plans.len();
        state.plans.retain(|p| p.id != plan_id);
        let deleted = state.plans.len() != before;
        if deleted {
            state.records.retain(|r| r.plan_id != plan_id);
            for verse in state.verses.iter_mut().filter(|v| v.plan_id == Some(plan_id)) {
                verse.plan_id = None;
            }
        }
        Ok(deleted)
    }

    async fn begin_plan_import(&self) -> PortResult<Box<dyn PlanImportTransaction>> {
        let state = self.lock();
        state.check_online()?;
        Ok(Box::new(InMemoryPlanImport {
            store: self.state.clone(),
            plans: state.plans.clone(),
            next_id: state.next_id,
            writes: 0,
            fault: state.import_fault,
        }))
    }

    async fn insert_reading_record(
        &self,
        user_id: i64,
        plan_id: i64,
        method: ReadingMethod,
    ) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        if state
            .records
            .iter()
            .any(|r| r.user_id == user_id && r.plan_id == plan_id)
        {
            return Err(PortError::Conflict("reading already recorded".to_string()));
        }
        let id = state.next_id();
        state.records.push(StoredRecord {
            id,
            user_id,
            plan_id,
            method,
            completed_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_reading_record(
        &self,
        user_id: i64,
        plan_id: i64,
    ) -> PortResult<Option<ReadingRecord>> {
        let state = self.lock();
        state.check_online()?;
        Ok(state
            .records
            .iter()
            .find(|r| r.user_id == user_id && r.plan_id == plan_id)
            .and_then(|r| state.record_with_date(r)))
    }

    async fn list_reading_records(
        &self,
        user_id: i64,
        window: DateWindow,
    ) -> PortResult<Vec<ReadingRecord>> {
        let state = self.lock();
        state.check_online()?;
        let mut records: Vec<ReadingRecord> = state
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| state.record_with_date(r))
            .filter(|r| window.contains(r.date))
            .collect();
        records.sort_by_key(|r| (r.date, r.id));
        Ok(records)
    }

    async fn insert_saved_verse(&self, verse: &NewSavedVerse) -> PortResult<SavedVerse> {
        let mut state = self.lock();
        state.check_online()?;
        let saved = SavedVerse {
            id: state.next_id(),
            user_id: verse.user_id,
            plan_id: verse.plan_id,
            reference_text: verse.reference_text.clone(),
            note: verse.note.clone(),
            created_at: Utc::now(),
        };
        state.verses.push(saved.clone());
        Ok(saved)
    }

    async fn list_saved_verses(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> PortResult<Vec<SavedVerse>> {
        let state = self.lock();
        state.check_online()?;
        let mut verses: Vec<SavedVerse> = state
            .verses
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        verses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(verses
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_saved_verses(&self, user_id: i64) -> PortResult<i64> {
        let state = self.lock();
        state.check_online()?;
        Ok(state.verses.iter().filter(|v| v.user_id == user_id).count() as i64)
    }

    async fn delete_saved_verse(&self, verse_id: i64, user_id: i64) -> PortResult<bool> {
        let mut state = self.lock();
        state.check_online()?;
        let before = state.verses.len();
        state
            .verses
            .retain(|v| !(v.id == verse_id && v.user_id == user_id));
        Ok(state.verses.len() != before)
    }

    async fn upsert_device(
        &self,
        user_id: i64,
        push_token: &str,
        platform: Platform,
    ) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        if let Some(device) = state.devices.iter_mut().find(|d| d.push_token == push_token) {
            device.user_id = user_id;
            device.platform = platform;
            return Ok(());
        }
        let id = state.next_id();
        state.devices.push(StoredDevice {
            id,
            user_id,
            push_token: push_token.to_string(),
            platform,
        });
        Ok(())
    }

    async fn delete_device(&self, user_id: i64, push_token: &str) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        state
            .devices
            .retain(|d| !(d.user_id == user_id && d.push_token == push_token));
        Ok(())
    }

    async fn insert_announcement(
        &self,
        title: &str,
        body: &str,
        created_by: i64,
    ) -> PortResult<Announcement> {
        let mut state = self.lock();
        state.check_online()?;
        let announcement = Announcement {
            id: state.next_id(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
            created_by,
        };
        state.announcements.push(announcement.clone());
        Ok(announcement)
    }

    async fn list_announcements(&self, limit: i64, offset: i64) -> PortResult<Vec<Announcement>> {
        let state = self.lock();
        state.check_online()?;
        let mut announcements = state.announcements.clone();
        announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(announcements
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn pending_recipients(&self, plan_id: i64) -> PortResult<Vec<PendingRecipient>> {
        let state = self.lock();
        state.check_online()?;
        let mut devices = state.devices.clone();
        devices.sort_by_key(|d| (d.user_id, d.id));

        let mut recipients: Vec<PendingRecipient> = Vec::new();
        for device in devices {
            let done = state
                .records
                .iter()
                .any(|r| r.user_id == device.user_id && r.plan_id == plan_id);
            if done {
                continue;
            }
            match recipients.last_mut() {
                Some(last) if last.user_id == device.user_id => last.tokens.push(device.push_token),
                _ => recipients.push(PendingRecipient {
                    user_id: device.user_id,
                    tokens: vec![device.push_token],
                }),
            }
        }
        Ok(recipients)
    }

    async fn insert_notification_log(&self, entry: &NotificationLogEntry) -> PortResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        state.notification_log.push(entry.clone());
        Ok(())
    }
}

/// Works on a private copy of the plan table; `commit` swaps it in.
struct InMemoryPlanImport {
    store: Arc<Mutex<MemoryState>>,
    plans: Vec<ReadingPlan>,
    next_id: i64,
    writes: usize,
    fault: Option<(usize, ImportFault)>,
}

impl InMemoryPlanImport {
    fn count_write(&mut self) -> PortResult<()> {
        let attempt = self.writes;
        self.writes += 1;
        match self.fault {
            Some((at, ImportFault::Unexpected)) if at == attempt => Err(PortError::Unexpected(
                format!("injected failure on write {attempt}"),
            )),
            Some((at, ImportFault::Conflict)) if at == attempt => Err(PortError::Conflict(
                format!("plan date taken before write {attempt}"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PlanImportTransaction for InMemoryPlanImport {
    async fn find_plan_id_by_date(&mut self, date: NaiveDate) -> PortResult<Option<i64>> {
        Ok(self.plans.iter().find(|p| p.date == date).map(|p| p.id))
    }

    async fn insert_plan(&mut self, entry: &PlanEntry) -> PortResult<()> {
        self.count_write()?;
        if self.plans.iter().any(|p| p.date == entry.date) {
            return Err(PortError::Conflict(format!("plan date {} is taken", entry.date)));
        }
        self.next_id += 1;
        self.plans.push(new_plan(self.next_id, entry));
        Ok(())
    }

    async fn update_plan_content(&mut self, plan_id: i64, entry: &PlanEntry) -> PortResult<()> {
        self.count_write()?;
        if let Some(plan) = self.plans.iter_mut().find(|p| p.id == plan_id) {
            plan.testament = entry.testament;
            plan.book = entry.book.clone();
            plan.chapter = entry.chapter;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        let InMemoryPlanImport {
            store,
            plans,
            next_id,
            ..
        } = *self;
        let mut state = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.plans = plans;
        state.next_id = state.next_id.max(next_id);
        Ok(())
    }
}

/// Collects every message instead of delivering it; each token counts as sent.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<PushMessage>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl NotificationProvider for RecordingNotifier {
    async fn send(&self, message: &PushMessage) -> PortResult<usize> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(message.tokens.len())
    }

    fn mode(&self) -> &'static str {
        "memory"
    }
}

/// Reversible "hash" so tests stay fast.
#[derive(Clone, Copy, Default)]
pub struct PlainTextHasher;

impl CredentialHasher for PlainTextHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, password_hash: &str) -> PortResult<bool> {
        Ok(password_hash.strip_prefix("plain:") == Some(password))
    }
}
