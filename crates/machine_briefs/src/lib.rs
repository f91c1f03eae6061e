pub mod cron;
pub mod manager;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use cron::CronSchedule;
pub use manager::{BriefManager, BriefRequest, BriefStats};
pub use scheduler::{BriefScheduler, TickReport};
pub use settings::SettingsStore;
pub use store::JsonFileStore;
