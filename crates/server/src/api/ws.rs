//! WebSocket change subscriptions, one connection per department.
//!
//! Frames carry only the trigger tag; clients re-fetch state through the
//! query endpoints and poll on their own interval as a fallback, so a lost
//! frame only delays a refresh.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use vestibule_core::Trigger;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Frame sent to subscribers when their department's state changed.
#[derive(Debug, Clone, Serialize)]
struct ChangeFrame {
    trigger: Trigger,
}

/// WebSocket upgrade handler for one department's change stream.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<String>,
) -> impl IntoResponse {
    // Unknown departments get a 404 instead of a silent dead channel
    if let Err(e) = state.departments().get(&department_id) {
        debug!("WebSocket subscription rejected: {}", e);
        return StatusCode::NOT_FOUND.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, department_id))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, department_id: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to this department's change events
    let mut rx = state.notifier().subscribe(&department_id);

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!(%department_id, "WebSocket client connected");

    // Forward change events to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let trigger_tag = match event.trigger {
                        Trigger::Join => "join",
                        Trigger::Next => "next",
                    };
                    WS_MESSAGES_SENT.with_label_values(&[trigger_tag]).inc();

                    let frame = ChangeFrame {
                        trigger: event.trigger,
                    };
                    match serde_json::to_string(&frame) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize change frame: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} changes", n);
                    WS_LAG_EVENTS.inc();
                    // Continue receiving - the client re-fetches anyway
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Change channel closed");
                    break;
                }
            }
        }
    });

    // Handle incoming messages from client (ping/pong, close)
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => {
                // We don't expect any client messages, but log them
                debug!("Received text message: {}", text);
            }
            Ok(_) => {
                // Ignore other message types
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!(%department_id, "WebSocket client disconnected");
}
