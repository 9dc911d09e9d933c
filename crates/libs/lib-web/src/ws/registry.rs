//! # Connection Registry
//!
//! Owns the set of live `/ws` connections. Each connection is represented by
//! the sending half of a bounded channel drained by that socket's writer
//! task. Frames are queued with `try_send`, so a broadcast never waits on a
//! slow socket.
//!
//! A member whose channel is closed or full is dropped. The registry holds the
//! only sender, so dropping it ends the writer once its queue drains and the
//! socket closes.

use std::collections::HashMap;

use lib_core::dto::WsEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Frames buffered per connection before it counts as stalled.
pub const OUTBOUND_BUFFER: usize = 64;

/// A registered connection: its id and the receiver its writer task drains.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub rx: mpsc::Receiver<String>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<String>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection; its frames arrive on `Connection::rx`.
    pub async fn register(&self) -> Connection {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let count = {
            let mut connections = self.connections.write().await;
            connections.insert(id, tx);
            connections.len()
        };
        info!(connection_id = %id, active = count, "[WS] Connection registered");
        Connection { id, rx }
    }

    /// Remove a connection. Unknown ids are ignored.
    pub async fn unregister(&self, id: ConnectionId) {
        if self.connections.write().await.remove(&id).is_some() {
            debug!(connection_id = %id, "[WS] Connection unregistered");
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Queue `frame` for one connection. `false` when the connection is gone
    /// or was dropped for falling behind.
    pub async fn send_to(&self, id: ConnectionId, frame: String) -> bool {
        let Some(tx) = self.connections.read().await.get(&id).cloned() else {
            return false;
        };
        if queue_frame(id, &tx, frame) {
            return true;
        }
        self.remove_all(&[id]).await;
        false
    }

    /// Send `event` to every connection. Returns how many accepted it.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "[WS] Failed to serialize broadcast");
                return 0;
            }
        };

        let members: Vec<(ConnectionId, mpsc::Sender<String>)> = self
            .connections
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in members {
            if queue_frame(id, &tx, frame.clone()) {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        self.remove_all(&dead).await;
        delivered
    }

    async fn remove_all(&self, ids: &[ConnectionId]) {
        if ids.is_empty() {
            return;
        }
        let mut connections = self.connections.write().await;
        for id in ids {
            connections.remove(id);
        }
        debug!(removed = ids.len(), "[WS] Dropped dead connections");
    }
}

fn queue_frame(id: ConnectionId, tx: &mpsc::Sender<String>, frame: String) -> bool {
    match tx.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(connection_id = %id, buffered = OUTBOUND_BUFFER, "[WS] Connection stalled, dropping");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
