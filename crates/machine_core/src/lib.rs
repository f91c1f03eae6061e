pub mod brief;
pub mod config;
pub mod error;
pub mod message;
pub mod settings;

pub use brief::{parse_deadline_days, resolve_deadline, Brief, BriefContent, BriefStatus};
pub use config::MachineConfig;
pub use error::{BriefError, Result};
pub use message::{format_admin_alert, BriefMessage, EmbedField};
pub use settings::{Language, ServerSettings, SettingsUpdate};

use async_trait::async_trait;

/// Produces the content of a new brief.
///
/// Implementations are stateless with respect to briefs: the same generator
/// may be called concurrently from the scheduler and from commands.
#[async_trait]
pub trait BriefGenerator: Send + Sync {
    async fn generate(&self, language: Language) -> anyhow::Result<BriefContent>;

    /// Short name used in logs and admin alerts.
    fn name(&self) -> &'static str;
}

/// A text channel briefs are posted to. Returns the id of the posted message.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn post(&self, channel_id: &str, message: &BriefMessage) -> anyhow::Result<String>;
}

/// Out-of-band notification to the bot operator.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, message: &str, detail: Option<&str>) -> anyhow::Result<()>;
}

/// Whole-set persistence for the active briefs.
#[async_trait]
pub trait BriefStore: Send + Sync {
    async fn read_all(&self) -> anyhow::Result<Vec<Brief>>;
    async fn write_all(&self, briefs: &[Brief]) -> anyhow::Result<()>;
}
