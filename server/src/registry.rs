//! Process-wide registry mapping session identifiers to live sessions.
//!
//! The registry is the single owner of session existence. It is created once
//! at startup and injected into the gateway and into every session it
//! creates; nothing in this crate reaches for ambient global state.

use crate::session::{GameSession, SessionInfo, Status};
use log::info;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::Serialize;
use shared::{TICK_RATE, WINNING_SCORE};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;

/// Per-session parameters, fixed at creation time.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed duration of one simulation tick.
    pub tick_interval: Duration,
    /// Score a side must reach to win the session.
    pub winning_score: u32,
    /// How long a finished session stays queryable before eviction.
    pub finished_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs_f32(1.0 / TICK_RATE as f32),
            winning_score: WINNING_SCORE,
            finished_grace: Duration::from_secs(5),
        }
    }
}

/// One row of the session listing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub id: String,
    pub status: Status,
    pub client_count: usize,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<GameSession>>>,
    handle: Weak<SessionRegistry>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Arc::new_cyclic(|handle| Self {
            sessions: RwLock::new(HashMap::new()),
            handle: handle.clone(),
            config,
        })
    }

    /// Registers a fresh, empty waiting session and returns its identifier.
    ///
    /// Creation is an explicit operation owned by whoever holds the
    /// registry; connections never create sessions implicitly.
    pub async fn create(&self) -> String {
        let id = new_session_id();
        let session = GameSession::new(id.clone(), self.config.clone(), self.handle.clone());
        self.sessions.write().await.insert(id.clone(), session);
        info!("session {} created", id);
        id
    }

    pub async fn get(&self, id: &str) -> Option<Arc<GameSession>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Evicts a session. Returns false if it was already gone.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("session {} evicted", id);
        }
        removed
    }

    /// Status, slot occupancy and scores of one session, if it exists.
    pub async fn session_info(&self, id: &str) -> Option<SessionInfo> {
        let session = self.get(id).await?;
        Some(session.info().await)
    }

    /// Lists all live sessions.
    pub async fn overview(&self) -> Vec<SessionOverview> {
        let sessions: Vec<Arc<GameSession>> =
            self.sessions.read().await.values().cloned().collect();

        let mut rows = Vec::with_capacity(sessions.len());
        for session in sessions {
            let info = session.info().await;
            rows.push(SessionOverview {
                id: session.id().to_string(),
                status: info.status,
                client_count: session.client_count().await,
            });
        }
        rows
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn new_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
