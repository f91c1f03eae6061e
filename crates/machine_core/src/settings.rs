use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BRIEF_DURATION_HOURS: u32 = 48;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Language::Fr),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Per-guild configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub guild_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief_channel_id: Option<String>,
    #[serde(default = "default_duration_hours")]
    pub brief_duration_hours: u32,
    #[serde(default)]
    pub auto_generate_briefs: bool,
    #[serde(default)]
    pub language: Language,
}

fn default_duration_hours() -> u32 {
    DEFAULT_BRIEF_DURATION_HOURS
}

impl ServerSettings {
    pub fn new(guild_id: &str) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            brief_channel_id: None,
            brief_duration_hours: DEFAULT_BRIEF_DURATION_HOURS,
            auto_generate_briefs: false,
            language: Language::Fr,
        }
    }

    /// Configured brief channel, ignoring empty ids.
    pub fn channel(&self) -> Option<&str> {
        self.brief_channel_id.as_deref().filter(|c| !c.is_empty())
    }

    /// True when this guild's configured channel is `channel_id`.
    /// An unset channel never matches.
    pub fn owns_channel(&self, channel_id: &str) -> bool {
        self.channel() == Some(channel_id)
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(channel) = update.brief_channel_id {
            self.brief_channel_id = Some(channel);
        }
        if let Some(hours) = update.brief_duration_hours {
            self.brief_duration_hours = hours.max(1);
        }
        if let Some(auto) = update.auto_generate_briefs {
            self.auto_generate_briefs = auto;
        }
        if let Some(language) = update.language {
            self.language = language;
        }
    }
}

/// Partial update merged into existing settings; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub brief_channel_id: Option<String>,
    pub brief_duration_hours: Option<u32>,
    pub auto_generate_briefs: Option<bool>,
    pub language: Option<Language>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.brief_channel_id.is_none()
            && self.brief_duration_hours.is_none()
            && self.auto_generate_briefs.is_none()
            && self.language.is_none()
    }
}
