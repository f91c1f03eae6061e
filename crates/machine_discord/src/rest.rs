//! Minimal Discord REST client: messages, DMs, interaction replies and
//! command registration.

use anyhow::{Context, Result};
use machine_core::config::DiscordConfig;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use crate::event::InteractionResponse;

pub struct DiscordRest {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordRest {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .context("DISCORD_TOKEN is not set")?;
        Self::with_base_url(&config.api_base_url, &token, config.request_timeout_secs)
    }

    pub fn with_base_url(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Post a message to a channel and return its id.
    pub async fn create_message(&self, channel_id: &str, body: &Value) -> Result<String> {
        let path = format!("/channels/{}/messages", channel_id);
        let message = self.send(self.request(Method::POST, &path).json(body)).await?;
        message["id"]
            .as_str()
            .map(String::from)
            .context("Discord returned a message without an id")
    }

    /// Open (or reuse) the DM channel with `user_id` and post `content` there.
    pub async fn send_direct_message(&self, user_id: &str, content: &str) -> Result<String> {
        let dm = self
            .send(
                self.request(Method::POST, "/users/@me/channels")
                    .json(&serde_json::json!({ "recipient_id": user_id })),
            )
            .await?;
        let channel_id = dm["id"]
            .as_str()
            .context("Discord returned a DM channel without an id")?;
        self.create_message(channel_id, &serde_json::json!({ "content": content }))
            .await
    }

    pub async fn respond(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        response: &InteractionResponse,
    ) -> Result<()> {
        let path = format!("/interactions/{}/{}/callback", interaction_id, interaction_token);
        self.send(self.request(Method::POST, &path).json(response))
            .await?;
        Ok(())
    }

    /// Replace the content of a deferred interaction reply.
    pub async fn edit_original_response(
        &self,
        application_id: &str,
        interaction_token: &str,
        content: &str,
    ) -> Result<()> {
        let path = format!(
            "/webhooks/{}/{}/messages/@original",
            application_id, interaction_token
        );
        self.send(
            self.request(Method::PATCH, &path)
                .json(&serde_json::json!({ "content": content })),
        )
        .await?;
        Ok(())
    }

    /// Overwrite the application's global slash commands.
    pub async fn register_commands(&self, application_id: &str, commands: &Value) -> Result<()> {
        let path = format!("/applications/{}/commands", application_id);
        self.send(self.request(Method::PUT, &path).json(commands))
            .await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bot {}", self.token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Discord request failed")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Discord API Error ({}): {}", status, text);
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).context("Failed to parse Discord response")
    }
}
