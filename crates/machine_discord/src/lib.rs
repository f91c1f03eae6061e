pub mod commands;
pub mod event;
pub mod gateway;
pub mod rest;
pub mod sinks;

pub use event::{CommandData, GatewayPayload, Interaction, InteractionResponse};
pub use gateway::GatewayClient;
pub use rest::DiscordRest;
pub use sinks::{AdminAlerts, DiscordChannel};
