//! crates/daily_reading_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database driver; they serialize to the
//! JSON shapes the admin console and the mobile client consume.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Closed Vocabularies
//=========================================================================================

/// Which half of the Bible a plan entry points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }

    /// Exact match only: `"Old"` or `" old"` are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "old" => Some(Self::Old),
            "new" => Some(Self::New),
            _ => None,
        }
    }
}

/// How the reader got through the day's chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingMethod {
    Physical,
    Digital,
}

impl ReadingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Digital => "digital",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "physical" => Some(Self::Physical),
            "digital" => Some(Self::Digital),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Push platforms a device may register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "android" => Some(Self::Android),
            "ios" => Some(Self::Ios),
            "web" => Some(Self::Web),
            _ => None,
        }
    }
}

//=========================================================================================
// Reading Schedule
//=========================================================================================

/// The scripture reading scheduled for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingPlan {
    pub id: i64,
    pub date: NaiveDate,
    pub testament: Testament,
    pub book: String,
    pub chapter: i32,
    pub created_at: DateTime<Utc>,
}

/// A validated plan entry that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub date: NaiveDate,
    pub testament: Testament,
    pub book: String,
    pub chapter: i32,
}

/// Evidence that a user read the plan of a given date.
///
/// `date` is the plan's date, joined in when the record is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingRecord {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub method: ReadingMethod,
    pub completed_at: DateTime<Utc>,
    pub date: NaiveDate,
}

//=========================================================================================
// User-owned Records
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedVerse {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: Option<i64>,
    pub reference_text: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSavedVerse {
    pub user_id: i64,
    pub plan_id: Option<i64>,
    pub reference_text: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
}

/// A user who still has unread scripture today, with every push token they registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecipient {
    pub user_id: i64,
    pub tokens: Vec<String>,
}

/// One row of the daily notification run log.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationLogEntry {
    pub run_date: NaiveDate,
    pub sent_count: i64,
    pub details: serde_json::Value,
}

//=========================================================================================
// Accounts
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

// A bearer token issued at login, resolvable until it expires
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}
