//! Application services. Each one owns the validation and orchestration for a
//! group of endpoints and talks to the outside world only through the ports.

pub mod accounts;
pub mod announcements;
pub mod devices;
pub mod notifications;
pub mod plans;
pub mod reading;
pub mod verses;

pub use accounts::{AccountService, AuthGrant};
pub use announcements::{AnnouncementPage, AnnouncementService};
pub use devices::DeviceService;
pub use notifications::{NotificationRunReport, NotificationService};
pub use plans::{ImportFailure, ImportReport, PlanService};
pub use reading::{HistorySummary, ReadingHistory, ReadingService};
pub use verses::{PageQuery, VersePage, VerseService};
