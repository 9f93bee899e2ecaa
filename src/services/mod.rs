// Service exports
pub mod booker;
pub mod notifier;
pub mod portal;
pub mod scheduler;

pub use booker::BookingRunner;
pub use notifier::{build_notifier, LogNotifier, NoopNotifier, Notifier, NotifyError, WebhookNotifier};
pub use portal::{parse_schedule, BookingPortal, PortalClient, PortalError};
pub use scheduler::{run_daily, DailySchedule, ScheduleError};
