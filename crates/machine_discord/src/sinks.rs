use anyhow::Result;
use async_trait::async_trait;
use machine_core::{format_admin_alert, AlertSink, BriefMessage, MessageChannel};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::DiscordRest;

/// Discord embed body for a brief.
pub fn embed_body(message: &BriefMessage) -> Value {
    let fields: Vec<Value> = message
        .fields
        .iter()
        .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
        .collect();
    json!({
        "embeds": [{
            "title": message.title,
            "color": message.color,
            "fields": fields,
            "footer": { "text": message.footer },
            "timestamp": message.timestamp.to_rfc3339(),
        }]
    })
}

/// Posts briefs as embeds in guild text channels.
pub struct DiscordChannel {
    rest: Arc<DiscordRest>,
}

impl DiscordChannel {
    pub fn new(rest: Arc<DiscordRest>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl MessageChannel for DiscordChannel {
    async fn post(&self, channel_id: &str, message: &BriefMessage) -> Result<String> {
        self.rest.create_message(channel_id, &embed_body(message)).await
    }
}

/// Direct messages the configured administrator.
pub struct AdminAlerts {
    rest: Option<Arc<DiscordRest>>,
    admin_user_id: Option<String>,
}

impl AdminAlerts {
    pub fn new(rest: Option<Arc<DiscordRest>>, admin_user_id: Option<String>) -> Self {
        Self {
            rest,
            admin_user_id: admin_user_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

#[async_trait]
impl AlertSink for AdminAlerts {
    async fn notify(&self, message: &str, detail: Option<&str>) -> Result<()> {
        let Some(admin) = self.admin_user_id.as_deref() else {
            tracing::error!("ADMIN_USER_ID not configured, cannot send alert: {}", message);
            return Ok(());
        };
        let Some(rest) = self.rest.as_ref() else {
            tracing::error!("Discord is not connected, cannot send alert: {}", message);
            return Ok(());
        };

        rest.send_direct_message(admin, &format_admin_alert(message, detail))
            .await?;
        tracing::info!("Admin alert sent to {}", admin);
        Ok(())
    }
}
