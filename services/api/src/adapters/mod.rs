pub mod db;
pub mod hasher;
pub mod notifications;

pub use db::DbAdapter;
pub use hasher::Argon2Hasher;
pub use notifications::LogNotificationProvider;
