//! WebSocket entry point: accepts connections and binds them to sessions.
//!
//! The target session is named out-of-band, in the `gameId` query parameter
//! of the upgrade request. Connections naming a session the registry does
//! not know are refused with close code 1008; they never create a session
//! implicitly. For everything that makes it past the handshake the gateway
//! guarantees exactly one `detach` call, whatever way the connection ends.

use crate::broadcast::ConnectionId;
use crate::registry::SessionRegistry;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::ClientMessage;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};

/// Close code for connections refused at the gateway (1008 on the wire).
/// Distinguishes "session not found" from a normal closure.
pub const REJECT_CLOSE_CODE: CloseCode = CloseCode::Policy;

pub struct Gateway {
    registry: Arc<SessionRegistry>,
    next_connection_id: AtomicU64,
}

impl Gateway {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Accept loop. Each inbound connection gets its own task; a failed
    /// handshake or transport error is scoped to that connection alone.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let gateway = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = gateway.handle_connection(stream, addr).await {
                            debug!("connection from {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> tungstenite::Result<()> {
        let mut request_uri = None;
        let mut ws = accept_hdr_async(stream, |req: &Request, resp: Response| {
            request_uri = Some(req.uri().clone());
            Ok(resp)
        })
        .await?;

        let session_id = request_uri
            .as_ref()
            .and_then(|uri| session_id_from_query(uri.query()));

        let session = match &session_id {
            Some(id) => self.registry.get(id).await,
            None => None,
        };

        let Some(session) = session else {
            warn!(
                "refusing connection from {}: session {:?} not found",
                addr, session_id
            );
            ws.close(Some(CloseFrame {
                code: REJECT_CLOSE_CODE,
                reason: "session not found".into(),
            }))
            .await?;
            // Drain until the peer acknowledges the close handshake
            while let Some(msg) = ws.next().await {
                if msg.is_err() {
                    break;
                }
            }
            return Ok(());
        };

        let connection_id: ConnectionId = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        info!(
            "connection {} from {} joining session {}",
            connection_id,
            addr,
            session.id()
        );

        let (mut ws_sink, mut ws_stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        // Writer task: drains the outbound queue into the socket so state
        // broadcasts never block on a slow peer
        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if ws_sink.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        });

        session.attach(connection_id, tx).await;

        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => session.handle_input(connection_id, client_msg).await,
                    Err(e) => {
                        warn!(
                            "connection {}: dropping malformed frame: {}",
                            connection_id, e
                        );
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => {
                    warn!(
                        "connection {}: dropping unexpected binary frame",
                        connection_id
                    );
                }
                Ok(_) => {} // ping/pong keepalive
                Err(e) => {
                    debug!("connection {}: transport error: {}", connection_id, e);
                    break;
                }
            }
        }

        // Single exit point for every way the read loop can end
        session.detach(connection_id).await;
        writer.abort();

        Ok(())
    }
}

/// Pulls the session identifier out of the upgrade request's query string.
fn session_id_from_query(query: Option<&str>) -> Option<String> {
    query?.split('&').find_map(|pair| {
        pair.strip_prefix("gameId=")
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}
