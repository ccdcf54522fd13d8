pub mod dates;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod streak;
pub mod validation;

#[cfg(feature = "testing")]
pub mod memory;

pub use domain::{
    Announcement, AuthSession, NewSavedVerse, NotificationLogEntry, PendingRecipient, Platform,
    PlanEntry, ReadingMethod, ReadingPlan, ReadingRecord, Role, SavedVerse, Testament, User,
    UserCredentials,
};
pub use error::{ServiceError, ServiceResult};
pub use ports::{
    CredentialHasher, DatabaseService, NotificationProvider, PlanImportTransaction, PortError,
    PortResult, PushMessage,
};
