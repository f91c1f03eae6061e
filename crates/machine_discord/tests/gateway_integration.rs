//! Gateway handshake against a local websocket server.

use futures::{SinkExt, StreamExt};
use machine_discord::GatewayClient;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::protocol::Message;

#[tokio::test]
async fn test_identify_and_forward_interaction() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        let hello = json!({"op": 10, "d": {"heartbeat_interval": 45000}, "s": null, "t": null});
        ws.send(Message::Text(hello.to_string())).await.unwrap();

        let identify = loop {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                break serde_json::from_str::<Value>(&text).unwrap();
            }
        };

        let dispatch = json!({
            "op": 0, "s": 1, "t": "INTERACTION_CREATE",
            "d": {
                "id": "i1", "application_id": "a1", "type": 2, "token": "itok",
                "guild_id": "g1", "channel_id": "c1",
                "data": {"name": "brief", "options": [{"name": "action", "type": 3, "value": "active"}]}
            }
        });
        ws.send(Message::Text(dispatch.to_string())).await.unwrap();

        // Keep the socket open until the client is done.
        let _ = ws.next().await;
        identify
    });

    let (client, mut interactions) =
        GatewayClient::connect(&format!("ws://{}", addr), "bot-token").unwrap();

    let interaction = tokio::time::timeout(Duration::from_secs(5), interactions.recv())
        .await
        .expect("timed out waiting for interaction")
        .expect("gateway closed");
    assert_eq!(interaction.id, "i1");
    assert_eq!(interaction.guild_id.as_deref(), Some("g1"));
    assert_eq!(interaction.data.unwrap().string("action"), Some("active"));

    client.shutdown();
    let identify = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], "bot-token");
    assert_eq!(identify["d"]["intents"], 1);
}
