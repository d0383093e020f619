//! WebSocket handler: init handshake + unified bus event streaming.
//!
//! Protocol:
//!   1. Client sends:  `{ "type": "start", "name": "Court 1 scoreboard" }`
//!   2. Server sends:  `{ "type": "init", "source_id": "ws.1a2b3c4d", "match": { ... } | null }`
//!   3. Server streams `RallypointMessage` events
//!   4. Client may send `{ "cmd": "score", "team": "A" }`, `{ "cmd": "undo" }`,
//!      `{ "cmd": "reset" }`

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::types::WsCommand;
use super::WebState;
use rallypoint::{MatchAction, RallypointMessage};

/// GET /api/ws: upgrade to WebSocket.
pub async fn ws_upgrade(
    State(state): State<Arc<WebState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(socket: WebSocket, state: Arc<WebState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Phase 1: Wait for "start" message from client
    let client_name = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Some(name) = parse_start_message(&text) {
                    break name;
                }
                // Not a start message: ignore and keep waiting
            }
            Some(Ok(Message::Close(_))) | None => return,
            _ => continue,
        }
    };

    // Phase 2: Send "init" response with source_id and the live match
    let source_id = new_source_id();
    state.ws_count.fetch_add(1, Ordering::Relaxed);
    state.publish_telemetry();
    tracing::info!(
        "ws: client '{}' connected (source_id={})",
        client_name,
        source_id
    );

    // Subscribe before the snapshot so no update between the two is lost.
    let mut bus_rx = state.bus_tx.subscribe();
    let init_msg = serde_json::json!({
        "type": "init",
        "source_id": source_id,
        "match": state.root.session.snapshot(),
    });
    if ws_tx
        .send(Message::text(init_msg.to_string()))
        .await
        .is_err()
    {
        state.ws_count.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    // Phase 3: Stream bus events + receive commands
    let mut send_task = tokio::spawn(async move {
        loop {
            match bus_rx.recv().await {
                Ok(msg) => {
                    if let Ok(json) = serde_json::to_string(&msg)
                        && ws_tx.send(Message::text(json)).await.is_err()
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("ws: lagged {n}");
                }
            }
        }
    });

    let ws_source = source_id.clone();
    let bus_tx = state.bus_tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    handle_ws_command(&text, &ws_source, &bus_tx);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.ws_count.fetch_sub(1, Ordering::Relaxed);
    state.publish_telemetry();
    tracing::info!(
        "ws: client '{}' disconnected (source_id={})",
        client_name,
        source_id
    );
}

/// `ws.` plus 8 hex chars.
fn new_source_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("ws.{}", &id[..8])
}

/// Parse a "start" handshake message. Returns the client name if valid.
fn parse_start_message(text: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct StartMsg {
        #[serde(rename = "type")]
        msg_type: String,
        #[serde(default)]
        name: String,
    }
    let msg: StartMsg = serde_json::from_str(text).ok()?;
    if msg.msg_type == "start" {
        Some(if msg.name.is_empty() {
            "anonymous".to_string()
        } else {
            msg.name
        })
    } else {
        None
    }
}

/// Parse a client command into a match action. Unknown frames are `None`.
fn parse_ws_command(text: &str) -> Option<MatchAction> {
    match serde_json::from_str::<WsCommand>(text) {
        Ok(cmd) => Some(cmd.into()),
        Err(e) => {
            tracing::debug!("ws: ignoring frame: {e}");
            None
        }
    }
}

/// Emit a client command on the bus. Results reach every client through the
/// system actor's `MatchUpdate` broadcast.
fn handle_ws_command(text: &str, source: &str, bus_tx: &broadcast::Sender<RallypointMessage>) {
    if let Some(action) = parse_ws_command(text) {
        let _ = bus_tx.send(RallypointMessage::new(action).source(source));
    }
}
