//! # WebSocket Handler
//!
//! `GET /ws` upgrades to a WebSocket registered with the
//! [`ConnectionRegistry`].
//!
//! - Every inbound text frame is answered with
//!   `{"type":"ack","message":"Message received"}`.
//! - Wire status changes arrive as
//!   `{"type":"wire_update","wire_id":1,"status":"processing","user_id":1,"timestamp":1700000000.0}`.
//!
//! The socket is split into a writer task draining the connection's channel
//! and a reader task queueing acks through the registry. When either side
//! finishes, the other is aborted and the connection is unregistered. A
//! connection the registry dropped for falling behind ends the same way.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use lib_core::dto::WsEvent;
use tracing::{debug, error, info, warn};

use crate::ws::ConnectionRegistry;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<ConnectionRegistry>>,
) -> Response {
    debug!("[WS] Upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let connection = registry.register().await;
    let connection_id = connection.id;
    let mut frames = connection.rx;
    let started = Instant::now();

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.into())).await {
                debug!(connection_id = %connection_id, error = %e, "[WS] Send failed");
                break;
            }
        }
    });

    let ack = match serde_json::to_string(&WsEvent::ack()) {
        Ok(ack) => ack,
        Err(e) => {
            error!(error = %e, "[WS] Failed to serialize ack");
            send_task.abort();
            registry.unregister(connection_id).await;
            return;
        }
    };

    let acks = registry.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut received: u64 = 0;
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    received += 1;
                    debug!(connection_id = %connection_id, size = text.len(), "[WS] Message received");
                    if !acks.send_to(connection_id, ack.clone()).await {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!(connection_id = %connection_id, "[WS] Close received");
                    break;
                }
                Ok(Message::Binary(data)) => {
                    debug!(connection_id = %connection_id, size = data.len(), "[WS] Binary frame ignored");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Err(e) => {
                    warn!(connection_id = %connection_id, error = %e, "[WS] Receive error");
                    break;
                }
            }
        }
        received
    });

    let received = tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            0
        }
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or_else(|e| {
                error!(connection_id = %connection_id, error = ?e, "[WS] Reader task failed");
                0
            })
        }
    };

    registry.unregister(connection_id).await;
    info!(
        connection_id = %connection_id,
        duration_ms = started.elapsed().as_millis(),
        messages_received = received,
        "[WS] Disconnected"
    );
}
