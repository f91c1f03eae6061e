//! Slash command definitions registered at startup.

use serde_json::{json, Value};

const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_BOOLEAN: u8 = 5;
const OPTION_CHANNEL: u8 = 7;
const CHANNEL_GUILD_TEXT: u8 = 0;
const PERMISSION_ADMINISTRATOR: &str = "8";

pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 14;

pub fn brief_command() -> Value {
    json!({
        "name": "brief",
        "description": "Manage creative briefs",
        "options": [
            {
                "name": "action",
                "description": "Action to perform",
                "type": OPTION_STRING,
                "required": true,
                "choices": [
                    { "name": "new", "value": "new" },
                    { "name": "active", "value": "active" },
                    { "name": "complete", "value": "complete" },
                    { "name": "cancel", "value": "cancel" },
                ],
            },
            {
                "name": "days",
                "description": "Brief duration in days (for new briefs)",
                "type": OPTION_INTEGER,
                "min_value": MIN_DAYS,
                "max_value": MAX_DAYS,
            },
            {
                "name": "channel",
                "description": "Channel to send the brief to (for new briefs)",
                "type": OPTION_CHANNEL,
            },
            {
                "name": "id",
                "description": "Brief ID (for completing or cancelling briefs)",
                "type": OPTION_STRING,
            },
        ],
    })
}

pub fn config_command() -> Value {
    json!({
        "name": "config",
        "description": "Configure bot settings",
        "default_member_permissions": PERMISSION_ADMINISTRATOR,
        "options": [
            {
                "name": "setting",
                "description": "Setting to configure",
                "type": OPTION_STRING,
                "required": true,
                "choices": [{ "name": "brief", "value": "brief" }],
            },
            {
                "name": "channel",
                "description": "Default channel for briefs",
                "type": OPTION_CHANNEL,
                "channel_types": [CHANNEL_GUILD_TEXT],
            },
            {
                "name": "defaultdays",
                "description": "Default brief duration in days",
                "type": OPTION_INTEGER,
                "min_value": MIN_DAYS,
                "max_value": MAX_DAYS,
            },
            {
                "name": "autogenerate",
                "description": "Enable automatic brief generation",
                "type": OPTION_BOOLEAN,
            },
            {
                "name": "language",
                "description": "Language of generated briefs",
                "type": OPTION_STRING,
                "choices": [
                    { "name": "Français", "value": "fr" },
                    { "name": "English", "value": "en" },
                ],
            },
        ],
    })
}

/// Body for the bulk-overwrite global commands endpoint.
pub fn all_commands() -> Value {
    json!([brief_command(), config_command()])
}
