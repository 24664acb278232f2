//! A single game session: role bindings, lifecycle transitions, and the
//! tick loop that drives the authoritative simulation.
//!
//! The session is the sole writer of lifecycle state and role bindings. All
//! internal state sits behind one per-session lock; sessions never share a
//! lock, so one session can never stall another. Broadcast delivery goes
//! through unbounded per-connection channels and never blocks while the lock
//! is held.

use crate::broadcast::{self, ClientHandle, ConnectionId, Outbound};
use crate::registry::{SessionConfig, SessionRegistry};
use crate::simulation::{Simulation, StepOutcome};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use shared::{ClientMessage, Role, Score, ServerMessage, PADDLE_INPUT_SCALE};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Lifecycle status of a session. Transitions are one-way:
/// `Waiting` → `Active` → `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Waiting,
    Active,
    Finished,
}

/// Read-only snapshot served to the session query interface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub status: Status,
    pub left_occupied: bool,
    pub right_occupied: bool,
    pub score: Score,
}

struct SessionState {
    status: Status,
    left: Option<ConnectionId>,
    right: Option<ConnectionId>,
    clients: HashMap<ConnectionId, ClientHandle>,
    simulation: Simulation,
    tick_task: Option<JoinHandle<()>>,
}

/// One isolated match instance.
///
/// Created and owned by the [`SessionRegistry`]; holds a weak back-reference
/// so it can evict itself once it terminates or empties out.
pub struct GameSession {
    id: String,
    config: SessionConfig,
    registry: Weak<SessionRegistry>,
    handle: Weak<GameSession>,
    state: RwLock<SessionState>,
}

impl GameSession {
    pub fn new(
        id: String,
        config: SessionConfig,
        registry: Weak<SessionRegistry>,
    ) -> Arc<Self> {
        let simulation = Simulation::new(config.winning_score);
        Arc::new_cyclic(|handle| Self {
            id,
            config,
            registry,
            handle: handle.clone(),
            state: RwLock::new(SessionState {
                status: Status::Waiting,
                left: None,
                right: None,
                clients: HashMap::new(),
                simulation,
                tick_task: None,
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Binds a new connection to this session.
    ///
    /// The first free privileged slot wins while the session is still
    /// waiting; everyone else becomes a spectator. The connection receives
    /// its role assignment immediately, and the instant both privileged
    /// slots are occupied the game starts.
    pub async fn attach(&self, connection_id: ConnectionId, tx: Outbound) -> Role {
        let mut state = self.state.write().await;

        let role = if state.status == Status::Waiting && state.left.is_none() {
            state.left = Some(connection_id);
            Role::Left
        } else if state.status == Status::Waiting && state.right.is_none() {
            state.right = Some(connection_id);
            Role::Right
        } else {
            Role::Spectator
        };

        let client = ClientHandle::new(connection_id, role, tx);
        client.send(&ServerMessage::Assign { role });
        state.clients.insert(connection_id, client);
        info!(
            "session {}: connection {} attached as {:?}",
            self.id, connection_id, role
        );

        if state.status == Status::Waiting && state.left.is_some() && state.right.is_some() {
            self.start(&mut state);
        }

        role
    }

    /// Removes a connection. Safe to call more than once; repeat calls are
    /// no-ops.
    ///
    /// Vacating a privileged slot while the game is running forfeits the
    /// match to the surviving player. When the last connection leaves, the
    /// session evicts itself from the registry immediately, skipping the
    /// grace delay used for normal terminations.
    pub async fn detach(&self, connection_id: ConnectionId) {
        let evict = {
            let mut state = self.state.write().await;
            if state.clients.remove(&connection_id).is_none() {
                return;
            }

            let vacated = if state.left == Some(connection_id) {
                state.left = None;
                Some(Role::Left)
            } else if state.right == Some(connection_id) {
                state.right = None;
                Some(Role::Right)
            } else {
                None
            };

            if let Some(role) = vacated {
                info!("session {}: {:?} player disconnected", self.id, role);
                if state.status == Status::Active {
                    // A vacancy mid-game is a forfeit, not a pause
                    if let Some(winner) = role.opponent() {
                        self.finish(&mut state, winner);
                    }
                }
            } else {
                debug!(
                    "session {}: connection {} detached",
                    self.id, connection_id
                );
            }

            state.clients.is_empty()
        };

        if evict {
            if let Some(registry) = self.registry.upgrade() {
                registry.remove(&self.id).await;
            }
        }
    }

    /// Applies a client message to the simulation.
    ///
    /// Only paddle moves from a connection currently holding a privileged
    /// role in an active session have any effect; everything else degrades
    /// to a no-op.
    pub async fn handle_input(&self, connection_id: ConnectionId, msg: ClientMessage) {
        let ClientMessage::PaddleMove { y } = msg;

        let mut state = self.state.write().await;
        if state.status != Status::Active {
            return;
        }
        let Some(role) = state.clients.get(&connection_id).map(|c| c.role) else {
            return;
        };
        state.simulation.set_paddle(role, y * PADDLE_INPUT_SCALE);
    }

    /// Reports status, slot occupancy and scores without mutating anything.
    pub async fn info(&self) -> SessionInfo {
        let state = self.state.read().await;
        SessionInfo {
            status: state.status,
            left_occupied: state.left.is_some(),
            right_occupied: state.right.is_some(),
            score: state.simulation.score,
        }
    }

    pub async fn client_count(&self) -> usize {
        self.state.read().await.clients.len()
    }

    /// Transitions `Waiting` → `Active` and starts the tick loop. Called
    /// with the state lock held.
    fn start(&self, state: &mut SessionState) {
        state.status = Status::Active;
        broadcast::fan_out(state.clients.values(), &ServerMessage::GameStart);
        info!("session {}: started", self.id);

        if let Some(session) = self.handle.upgrade() {
            state.tick_task = Some(tokio::spawn(session.run_tick_loop()));
        }
    }

    /// Transitions `Active` → `Finished`. Called with the state lock held.
    ///
    /// Stops the tick loop before anything else, so the game-over notice is
    /// guaranteed to be the last message of the session, then schedules the
    /// delayed registry eviction that lets late stragglers read it.
    fn finish(&self, state: &mut SessionState, winner: Role) {
        if state.status == Status::Finished {
            return;
        }
        state.status = Status::Finished;

        if let Some(task) = state.tick_task.take() {
            task.abort();
        }

        broadcast::fan_out(state.clients.values(), &ServerMessage::GameOver { winner });
        info!("session {}: finished, winner {:?}", self.id, winner);

        let registry = self.registry.clone();
        let id = self.id.clone();
        let grace = self.config.finished_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(registry) = registry.upgrade() {
                registry.remove(&id).await;
            }
        });
    }

    /// Advances the simulation once per tick interval until the session
    /// leaves the active state.
    async fn run_tick_loop(self: Arc<Self>) {
        let mut timer = interval(self.config.tick_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let dt = self.config.tick_interval.as_secs_f32();
        let mut rng = StdRng::from_entropy();

        // Skip the first tick since it fires immediately
        timer.tick().await;

        loop {
            timer.tick().await;

            let mut state = self.state.write().await;
            if state.status != Status::Active {
                break;
            }

            match state.simulation.step(dt, &mut rng) {
                StepOutcome::Continue => {
                    let msg = ServerMessage::State {
                        ball: state.simulation.ball,
                        paddles: state.simulation.paddles,
                        score: state.simulation.score,
                    };
                    broadcast::fan_out(state.clients.values(), &msg);
                }
                StepOutcome::Finished(winner) => {
                    self.finish(&mut state, winner);
                    break;
                }
            }
        }
    }
}
