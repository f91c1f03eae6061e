//! Discord gateway connection.
//!
//! Only what slash commands need: Hello, Identify, heartbeats and
//! `INTERACTION_CREATE` dispatches. No resume; a dropped session is
//! re-identified after a capped backoff.

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::event::{opcode, GatewayPayload, Interaction};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const MAX_BACKOFF_SECS: u64 = 60;

pub struct GatewayClient {
    task: JoinHandle<()>,
}

impl GatewayClient {
    /// Spawn the connection task. Interactions arrive on the returned receiver.
    pub fn connect(url: &str, token: &str) -> Result<(Self, mpsc::Receiver<Interaction>)> {
        let ws_url = Url::parse(url).context("Invalid Discord gateway URL")?;
        let token = token.to_string();
        let (tx, rx) = mpsc::channel::<Interaction>(32);

        let task = tokio::spawn(async move {
            let mut retry_count = 0u32;
            loop {
                tracing::info!("Connecting to Discord gateway at {}...", ws_url);
                match connect_async(&ws_url).await {
                    Ok((ws_stream, _)) => {
                        tracing::info!("Connected to Discord gateway");
                        retry_count = 0;
                        if let Err(e) = Self::handle_connection(ws_stream, &token, &tx).await {
                            tracing::error!("Gateway connection error: {:#}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to connect to Discord gateway: {}", e);
                    }
                }
                if tx.is_closed() {
                    tracing::info!("Interaction receiver dropped, closing gateway");
                    return;
                }

                let wait_secs = backoff_secs(retry_count);
                tracing::warn!("Reconnecting to Discord gateway in {}s...", wait_secs);
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                retry_count = retry_count.saturating_add(1);
            }
        });

        Ok((Self { task }, rx))
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }

    async fn handle_connection(
        stream: WsStream,
        token: &str,
        tx: &mpsc::Sender<Interaction>,
    ) -> Result<()> {
        let (mut write, mut read) = stream.split();

        let interval_ms = loop {
            match read.next().await {
                Some(msg) => {
                    if let Some(payload) = decode(msg?) {
                        if let Some(ms) = payload.hello_interval_ms() {
                            break ms;
                        }
                    }
                }
                None => anyhow::bail!("Gateway closed before Hello"),
            }
        };
        tracing::debug!("Gateway heartbeat interval {}ms", interval_ms);

        write.send(encode(&GatewayPayload::identify(token))?).await?;

        let period = Duration::from_millis(interval_ms.max(1));
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        let mut seq: Option<u64> = None;
        let mut acked = true;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !acked {
                        anyhow::bail!("Heartbeat not acknowledged");
                    }
                    acked = false;
                    write.send(encode(&GatewayPayload::heartbeat(seq))?).await?;
                }
                msg = read.next() => {
                    let Some(msg) = msg else {
                        tracing::warn!("Gateway stream ended");
                        return Ok(());
                    };
                    let msg = msg?;
                    if let Message::Close(frame) = &msg {
                        tracing::warn!("Gateway closed the connection: {:?}", frame);
                        return Ok(());
                    }
                    let Some(payload) = decode(msg) else { continue };
                    if payload.s.is_some() {
                        seq = payload.s;
                    }

                    match payload.op {
                        opcode::DISPATCH => {
                            if let Some(interaction) = interaction_from_dispatch(&payload) {
                                if tx.send(interaction).await.is_err() {
                                    return Ok(());
                                }
                            } else if payload.t.as_deref() == Some("READY") {
                                tracing::info!("Discord session ready");
                            }
                        }
                        opcode::HEARTBEAT => {
                            write.send(encode(&GatewayPayload::heartbeat(seq))?).await?;
                        }
                        opcode::HEARTBEAT_ACK => acked = true,
                        opcode::RECONNECT | opcode::INVALID_SESSION => {
                            tracing::warn!("Gateway requested a new session (op {})", payload.op);
                            return Ok(());
                        }
                        other => tracing::debug!("Ignored gateway op {}", other),
                    }
                }
            }
        }
    }
}

/// The interaction carried by an `INTERACTION_CREATE` dispatch, if any.
pub fn interaction_from_dispatch(payload: &GatewayPayload) -> Option<Interaction> {
    if payload.op != opcode::DISPATCH || payload.t.as_deref() != Some("INTERACTION_CREATE") {
        return None;
    }
    match serde_json::from_value(payload.d.clone()) {
        Ok(interaction) => Some(interaction),
        Err(e) => {
            tracing::warn!("Unparseable interaction: {}", e);
            None
        }
    }
}

fn backoff_secs(retry_count: u32) -> u64 {
    MAX_BACKOFF_SECS.min(2u64.saturating_pow(retry_count))
}

fn decode(msg: Message) -> Option<GatewayPayload> {
    let Message::Text(text) = msg else {
        return None;
    };
    match serde_json::from_str(&text) {
        Ok(payload) => Some(payload),
        Err(_) => {
            tracing::debug!("Ignored unparseable gateway frame");
            None
        }
    }
}

fn encode(payload: &GatewayPayload) -> Result<Message> {
    Ok(Message::Text(serde_json::to_string(payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_secs(0), 1);
        assert_eq!(backoff_secs(3), 8);
        assert_eq!(backoff_secs(6), 60);
        assert_eq!(backoff_secs(200), 60);
    }

    #[test]
    fn test_only_interaction_dispatches_are_forwarded() {
        let ready: GatewayPayload =
            serde_json::from_str(r#"{"op":0,"t":"READY","s":1,"d":{"v":10}}"#).unwrap();
        assert!(interaction_from_dispatch(&ready).is_none());

        let create: GatewayPayload = serde_json::from_str(
            r#"{"op":0,"t":"INTERACTION_CREATE","s":2,"d":{
                "id":"i1","application_id":"a1","type":2,"token":"tok",
                "channel_id":"c1","data":{"name":"brief","options":[]}}}"#,
        )
        .unwrap();
        let interaction = interaction_from_dispatch(&create).unwrap();
        assert_eq!(interaction.id, "i1");
        assert_eq!(interaction.command_name(), Some("brief"));
        assert!(interaction.guild_id.is_none());
    }
}
