use machine_briefs::{BriefManager, BriefRequest, SettingsStore};
use machine_core::{Brief, Language, ServerSettings, SettingsUpdate};
use machine_discord::commands::{MAX_DAYS, MIN_DAYS};
use machine_discord::{CommandData, Interaction};
use std::sync::Arc;

const DEFAULT_DAYS: i64 = 2;

/// Text answered to a slash command.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    pub ephemeral: bool,
}

impl Reply {
    fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

pub struct CommandHandler {
    manager: Arc<BriefManager>,
    settings: Arc<SettingsStore>,
}

impl CommandHandler {
    pub fn new(manager: Arc<BriefManager>, settings: Arc<SettingsStore>) -> Self {
        Self { manager, settings }
    }

    /// Commands that generate content and must be acknowledged first.
    pub fn defers(interaction: &Interaction) -> bool {
        interaction.command_name() == Some("brief")
            && interaction.data.as_ref().and_then(|d| d.string("action")) == Some("new")
    }

    pub async fn handle(&self, interaction: &Interaction) -> Reply {
        let Some(data) = interaction.data.as_ref() else {
            return Reply::private("❌ Unknown command.");
        };
        match data.name.as_str() {
            "brief" => self.brief(interaction, data).await,
            "config" => self.config(interaction, data).await,
            other => {
                tracing::warn!("Unknown command: {}", other);
                Reply::private("❌ Unknown command.")
            }
        }
    }

    async fn brief(&self, interaction: &Interaction, data: &CommandData) -> Reply {
        match data.string("action") {
            Some("new") => self.new_brief(interaction, data).await,
            Some("active") => self.active_briefs(interaction).await,
            Some("complete") => {
                let Some(id) = data.string("id") else {
                    return Reply::private("❌ Please provide a brief ID to complete.");
                };
                match self.manager.complete_brief(id).await {
                    Ok(_) => Reply::public(format!("✅ **Brief completed!**\nID: `{}`", id)),
                    Err(e) => {
                        tracing::warn!("Could not complete brief {}: {}", id, e);
                        Reply::private(format!(
                            "❌ Unable to complete brief `{}`. Please check the ID.",
                            id
                        ))
                    }
                }
            }
            Some("cancel") => {
                let Some(id) = data.string("id") else {
                    return Reply::private("❌ Please provide a brief ID to cancel.");
                };
                match self.manager.cancel_brief(id).await {
                    Ok(_) => Reply::public(format!("🚫 **Brief cancelled.**\nID: `{}`", id)),
                    Err(e) => {
                        tracing::warn!("Could not cancel brief {}: {}", id, e);
                        Reply::private(format!(
                            "❌ Unable to cancel brief `{}`. Please check the ID.",
                            id
                        ))
                    }
                }
            }
            other => Reply::private(format!("❌ Unknown action: {}", other.unwrap_or("none"))),
        }
    }

    async fn new_brief(&self, interaction: &Interaction, data: &CommandData) -> Reply {
        let settings = match interaction.guild_id.as_deref() {
            Some(guild_id) => Some(self.settings.get(guild_id).await),
            None => None,
        };

        // Option, then the guild's configured channel, then where the command ran.
        let channel_id = data
            .string("channel")
            .or_else(|| settings.as_ref().and_then(|s| s.channel()))
            .or(interaction.channel_id.as_deref());
        let Some(channel_id) = channel_id else {
            return Reply::private("❌ No channel to post the brief in.");
        };

        let hours = days_to_hours(data.integer("days"));
        let mut request = match settings.as_ref() {
            Some(s) => BriefRequest::for_guild(s, channel_id),
            None => BriefRequest::new(channel_id, hours),
        };
        request.duration_hours = hours;

        match self.manager.create(request).await {
            Ok(brief) => Reply::public(format!(
                "✅ **New brief created!**\n\n**Company:** {}\n**ID:** `{}`",
                brief.content.company_name, brief.id
            )),
            Err(e) => {
                tracing::error!("Brief command failed: {}", e);
                Reply::public("❌ Error creating the brief.")
            }
        }
    }

    async fn active_briefs(&self, interaction: &Interaction) -> Reply {
        let guild = interaction.guild_id.as_deref();
        let briefs: Vec<Brief> = self
            .manager
            .get_active_briefs()
            .await
            .into_iter()
            .filter(|b| b.guild_id.is_none() || b.guild_id.as_deref() == guild)
            .collect();

        if briefs.is_empty() {
            return Reply::private("📭 No active briefs at the moment.");
        }

        let list = briefs
            .iter()
            .map(|b| {
                format!(
                    "**{}**\n├ ID: `{}`\n└ Deadline: <t:{}:R>",
                    b.content.company_name,
                    b.id,
                    b.deadline.timestamp()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Reply::private(format!("## 📋 Active Briefs\n\n{}", list))
    }

    async fn config(&self, interaction: &Interaction, data: &CommandData) -> Reply {
        let Some(guild_id) = interaction.guild_id.as_deref() else {
            return Reply::private("❌ This command can only be used in a server.");
        };
        if data.string("setting") != Some("brief") {
            return Reply::private("❌ Unknown setting.");
        }

        let mut update = SettingsUpdate::default();
        let mut lines = vec!["## ⚙️ Brief Configuration\n".to_string()];

        if let Some(channel) = data.string("channel") {
            update.brief_channel_id = Some(channel.to_string());
            lines.push(format!("**Channel:** <#{}>", channel));
        }
        if let Some(days) = data.integer("defaultdays") {
            let days = days.clamp(MIN_DAYS, MAX_DAYS);
            update.brief_duration_hours = Some(days_to_hours(Some(days)));
            lines.push(format!("**Default Duration:** {} days", days));
        }
        if let Some(auto) = data.boolean("autogenerate") {
            update.auto_generate_briefs = Some(auto);
            lines.push(format!("**Auto-generate:** {}", enabled(auto)));
        }
        if let Some(raw) = data.string("language") {
            match raw.parse::<Language>() {
                Ok(language) => {
                    update.language = Some(language);
                    lines.push(format!("**Language:** {}", language));
                }
                Err(e) => return Reply::private(format!("❌ {}", e)),
            }
        }

        if update.is_empty() {
            let current = self.settings.get(guild_id).await;
            return Reply::private(describe(&current));
        }

        match self.settings.update(guild_id, update).await {
            Ok(_) => Reply::public(lines.join("\n")),
            Err(e) => {
                tracing::error!("Failed to save settings for guild {}: {:#}", guild_id, e);
                Reply::private("❌ Failed to save the configuration.")
            }
        }
    }
}

fn days_to_hours(days: Option<i64>) -> u32 {
    let days = days.unwrap_or(DEFAULT_DAYS).clamp(MIN_DAYS, MAX_DAYS);
    (days * 24) as u32
}

fn enabled(on: bool) -> &'static str {
    if on {
        "Enabled ✅"
    } else {
        "Disabled ❌"
    }
}

fn describe(settings: &ServerSettings) -> String {
    let channel = match settings.channel() {
        Some(id) => format!("<#{}>", id),
        None => "Not set".to_string(),
    };
    format!(
        "## ⚙️ Current Brief Configuration\n\n**Channel:** {}\n**Default Duration:** {} days\n**Auto-generate:** {}\n**Language:** {}",
        channel,
        settings.brief_duration_hours / 24,
        enabled(settings.auto_generate_briefs),
        settings.language
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use machine_core::{AlertSink, BriefMessage, BriefStore, MessageChannel};
    use machine_generator::FallbackGenerator;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Posts(Mutex<Vec<String>>);

    #[async_trait]
    impl MessageChannel for Posts {
        async fn post(&self, channel_id: &str, _message: &BriefMessage) -> anyhow::Result<String> {
            self.0.lock().unwrap().push(channel_id.to_string());
            Ok("m".into())
        }
    }

    struct Quiet;

    #[async_trait]
    impl AlertSink for Quiet {
        async fn notify(&self, _message: &str, _detail: Option<&str>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl BriefStore for Quiet {
        async fn read_all(&self) -> anyhow::Result<Vec<Brief>> {
            Ok(vec![])
        }

        async fn write_all(&self, _briefs: &[Brief]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        handler: CommandHandler,
        manager: Arc<BriefManager>,
        settings: Arc<SettingsStore>,
        posts: Arc<Posts>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::TempDir::new().unwrap();
        let posts = Arc::new(Posts::default());
        let manager = Arc::new(BriefManager::new(
            Arc::new(FallbackGenerator::new()),
            posts.clone(),
            Arc::new(Quiet),
            Arc::new(Quiet),
        ));
        let settings = Arc::new(SettingsStore::new(dir.path().join("servers.json")));
        Fixture {
            handler: CommandHandler::new(manager.clone(), settings.clone()),
            manager,
            settings,
            posts,
            _dir: dir,
        }
    }

    fn command(name: &str, guild: Option<&str>, options: serde_json::Value) -> Interaction {
        serde_json::from_value(json!({
            "id": "i1", "application_id": "a1", "type": 2, "token": "tok",
            "guild_id": guild, "channel_id": "here",
            "data": {"name": name, "options": options}
        }))
        .unwrap()
    }

    fn opt(name: &str, kind: u8, value: serde_json::Value) -> serde_json::Value {
        json!({"name": name, "type": kind, "value": value})
    }

    #[test]
    fn test_days_to_hours() {
        assert_eq!(days_to_hours(None), 48);
        assert_eq!(days_to_hours(Some(5)), 120);
        assert_eq!(days_to_hours(Some(0)), 24);
        assert_eq!(days_to_hours(Some(30)), 14 * 24);
    }

    #[test]
    fn test_only_new_briefs_defer() {
        let new = command("brief", Some("g1"), json!([opt("action", 3, json!("new"))]));
        let active = command("brief", Some("g1"), json!([opt("action", 3, json!("active"))]));
        assert!(CommandHandler::defers(&new));
        assert!(!CommandHandler::defers(&active));
    }

    #[tokio::test]
    async fn test_new_brief_channel_precedence() {
        let f = fixture();

        // Invoking channel when nothing else is set.
        let reply = f
            .handler
            .handle(&command("brief", Some("g1"), json!([opt("action", 3, json!("new"))])))
            .await;
        assert!(reply.content.starts_with("✅ **New brief created!**"));

        // Guild setting beats the invoking channel.
        f.settings
            .update(
                "g1",
                SettingsUpdate {
                    brief_channel_id: Some("configured".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        f.handler
            .handle(&command("brief", Some("g1"), json!([opt("action", 3, json!("new"))])))
            .await;

        // Explicit option beats both.
        f.handler
            .handle(&command(
                "brief",
                Some("g1"),
                json!([opt("action", 3, json!("new")), opt("channel", 7, json!("explicit"))]),
            ))
            .await;

        assert_eq!(*f.posts.0.lock().unwrap(), vec!["here", "configured", "explicit"]);
    }

    #[tokio::test]
    async fn test_new_brief_records_guild() {
        let f = fixture();
        f.handler
            .handle(&command(
                "brief",
                Some("g1"),
                json!([opt("action", 3, json!("new")), opt("days", 4, json!(3))]),
            ))
            .await;
        let briefs = f.manager.get_active_briefs().await;
        assert_eq!(briefs.len(), 1);
        assert_eq!(briefs[0].guild_id.as_deref(), Some("g1"));
    }

    #[tokio::test]
    async fn test_active_complete_and_cancel() {
        let f = fixture();
        let empty = f
            .handler
            .handle(&command("brief", Some("g1"), json!([opt("action", 3, json!("active"))])))
            .await;
        assert_eq!(empty, Reply::private("📭 No active briefs at the moment."));

        let a = f.manager.create_brief("c1", 48).await.unwrap();
        let b = f.manager.create_brief("c1", 48).await.unwrap();

        let list = f
            .handler
            .handle(&command("brief", Some("g1"), json!([opt("action", 3, json!("active"))])))
            .await;
        assert!(list.ephemeral);
        assert!(list.content.contains(&a.id));
        assert!(list.content.contains(&b.id));

        let done = f
            .handler
            .handle(&command(
                "brief",
                Some("g1"),
                json!([opt("action", 3, json!("complete")), opt("id", 3, json!(&a.id))]),
            ))
            .await;
        assert!(!done.ephemeral);
        assert!(done.content.starts_with("✅ **Brief completed!**"));

        let again = f
            .handler
            .handle(&command(
                "brief",
                Some("g1"),
                json!([opt("action", 3, json!("complete")), opt("id", 3, json!(&a.id))]),
            ))
            .await;
        assert!(again.ephemeral);
        assert!(again.content.contains("Please check the ID"));

        let cancelled = f
            .handler
            .handle(&command(
                "brief",
                Some("g1"),
                json!([opt("action", 3, json!("cancel")), opt("id", 3, json!(&b.id))]),
            ))
            .await;
        assert!(cancelled.content.starts_with("🚫"));
        assert!(f.manager.get_active_briefs().await.is_empty());

        let missing = f
            .handler
            .handle(&command("brief", Some("g1"), json!([opt("action", 3, json!("complete"))])))
            .await;
        assert_eq!(missing, Reply::private("❌ Please provide a brief ID to complete."));
    }

    #[tokio::test]
    async fn test_config_updates_and_shows() {
        let f = fixture();
        let current = f
            .handler
            .handle(&command("config", Some("g1"), json!([opt("setting", 3, json!("brief"))])))
            .await;
        assert!(current.ephemeral);
        assert!(current.content.contains("**Channel:** Not set"));
        assert!(current.content.contains("**Default Duration:** 2 days"));

        let reply = f
            .handler
            .handle(&command(
                "config",
                Some("g1"),
                json!([
                    opt("setting", 3, json!("brief")),
                    opt("channel", 7, json!("c7")),
                    opt("defaultdays", 4, json!(5)),
                    opt("autogenerate", 5, json!(true)),
                    opt("language", 3, json!("en"))
                ]),
            ))
            .await;
        assert!(!reply.ephemeral);
        assert!(reply.content.contains("**Channel:** <#c7>"));
        assert!(reply.content.contains("Enabled ✅"));

        let s = f.settings.get("g1").await;
        assert_eq!(s.channel(), Some("c7"));
        assert_eq!(s.brief_duration_hours, 120);
        assert!(s.auto_generate_briefs);
        assert_eq!(s.language, Language::En);
    }

    #[tokio::test]
    async fn test_config_outside_guild_is_refused() {
        let f = fixture();
        let reply = f
            .handler
            .handle(&command("config", None, json!([opt("setting", 3, json!("brief"))])))
            .await;
        assert_eq!(reply, Reply::private("❌ This command can only be used in a server."));
    }
}
