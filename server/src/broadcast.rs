//! State fan-out to the connections attached to a session.

use log::{debug, error};
use shared::{Role, ServerMessage};
use tokio::sync::mpsc;

/// Process-wide connection identifier assigned by the gateway.
pub type ConnectionId = u64;

/// Outbound half of a connection: frames pushed here are written to the
/// socket by the connection's writer task.
pub type Outbound = mpsc::UnboundedSender<String>;

/// Per-connection record held by the session manager.
///
/// Role lookup goes through this record, never through the transport object
/// itself.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub role: Role,
    pub tx: Outbound,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, role: Role, tx: Outbound) -> Self {
        Self { id, role, tx }
    }

    /// Queues a single message for this connection. Delivery failures are
    /// logged and otherwise ignored; the gateway's close detection owns
    /// connection cleanup.
    pub fn send(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(frame) => {
                if self.tx.send(frame).is_err() {
                    debug!("connection {}: outbound channel closed", self.id);
                }
            }
            Err(e) => error!("failed to serialize server message: {}", e),
        }
    }
}

/// Delivers one message to every client in the snapshot.
///
/// The message is serialized once. A failed send to one client never
/// prevents delivery to the others and never raises to the caller.
pub fn fan_out<'a>(clients: impl IntoIterator<Item = &'a ClientHandle>, msg: &ServerMessage) {
    let frame = match serde_json::to_string(msg) {
        Ok(frame) => frame,
        Err(e) => {
            error!("failed to serialize broadcast message: {}", e);
            return;
        }
    };

    for client in clients {
        if client.tx.send(frame.clone()).is_err() {
            debug!("connection {}: dropping broadcast frame", client.id);
        }
    }
}
