use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway opcodes used by the bot.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// `GUILDS` is the only intent needed for slash commands.
pub const INTENT_GUILDS: u64 = 1;

/// Envelope of every gateway frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

impl GatewayPayload {
    pub fn heartbeat(seq: Option<u64>) -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: serde_json::json!(seq),
            s: None,
            t: None,
        }
    }

    pub fn identify(token: &str) -> Self {
        Self {
            op: opcode::IDENTIFY,
            d: serde_json::json!({
                "token": token,
                "intents": INTENT_GUILDS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "la-machine",
                    "device": "la-machine",
                },
            }),
            s: None,
            t: None,
        }
    }

    /// Heartbeat interval announced by a Hello frame.
    pub fn hello_interval_ms(&self) -> Option<u64> {
        if self.op != opcode::HELLO {
            return None;
        }
        self.d.get("heartbeat_interval")?.as_u64()
    }
}

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

impl Interaction {
    pub fn is_command(&self) -> bool {
        self.kind == INTERACTION_APPLICATION_COMMAND && self.data.is_some()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    fn value(&self, name: &str) -> Option<&Value> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    /// String and channel options both arrive as JSON strings.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name)?.as_str()
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name)?.as_i64()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.value(name)?.as_bool()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
}

const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
const DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE: u8 = 5;
const PONG: u8 = 1;
const EPHEMERAL: u64 = 1 << 6;

/// Body posted to the interaction callback endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: PONG,
            data: None,
        }
    }

    pub fn message(content: &str, ephemeral: bool) -> Self {
        let mut data = serde_json::json!({ "content": content });
        if ephemeral {
            data["flags"] = serde_json::json!(EPHEMERAL);
        }
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(data),
        }
    }

    /// "Bot is thinking"; the real reply follows as an edit.
    pub fn deferred() -> Self {
        Self {
            kind: DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interaction() {
        let raw = r#"{
            "id": "111", "application_id": "222", "type": 2, "token": "tok",
            "guild_id": "g1", "channel_id": "c1",
            "data": {
                "id": "333", "name": "brief", "type": 1,
                "options": [
                    {"name": "action", "type": 3, "value": "new"},
                    {"name": "days", "type": 4, "value": 5},
                    {"name": "channel", "type": 7, "value": "c9"},
                    {"name": "autogenerate", "type": 5, "value": true}
                ]
            }
        }"#;
        let interaction: Interaction = serde_json::from_str(raw).unwrap();
        assert!(interaction.is_command());
        assert_eq!(interaction.command_name(), Some("brief"));

        let data = interaction.data.unwrap();
        assert_eq!(data.string("action"), Some("new"));
        assert_eq!(data.integer("days"), Some(5));
        assert_eq!(data.string("channel"), Some("c9"));
        assert_eq!(data.boolean("autogenerate"), Some(true));
        assert_eq!(data.string("id"), None);
    }

    #[test]
    fn test_hello_interval() {
        let hello: GatewayPayload =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .unwrap();
        assert_eq!(hello.hello_interval_ms(), Some(41250));
        assert_eq!(GatewayPayload::heartbeat(Some(3)).hello_interval_ms(), None);
    }

    #[test]
    fn test_response_shapes() {
        let json = serde_json::to_value(InteractionResponse::message("hi", true)).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["content"], "hi");
        assert_eq!(json["data"]["flags"], 64);

        let json = serde_json::to_value(InteractionResponse::deferred()).unwrap();
        assert_eq!(json, serde_json::json!({"type": 5}));
    }

    #[test]
    fn test_heartbeat_carries_sequence() {
        let json = serde_json::to_value(GatewayPayload::heartbeat(None)).unwrap();
        assert_eq!(json["op"], 1);
        assert!(json["d"].is_null());
        let json = serde_json::to_value(GatewayPayload::heartbeat(Some(42))).unwrap();
        assert_eq!(json["d"], 42);
    }
}
