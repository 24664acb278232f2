//! # Game Session Server Library
//!
//! This library provides the authoritative server implementation for a
//! real-time two-player ball-and-paddle game. Many independent sessions run
//! concurrently in one process; each owns its simulation state, its
//! player-role bindings and its broadcast stream.
//!
//! ## Core Responsibilities
//!
//! ### Session Lifecycle
//! Sessions are created explicitly through the registry and move one way
//! through `waiting` → `active` → `finished`. The game starts the instant
//! both privileged roles are occupied; a mid-game disconnect forfeits the
//! match to the surviving player; finished sessions linger briefly so late
//! stragglers can read the termination notice, then evict themselves.
//!
//! ### Authoritative Simulation
//! A per-session tick loop advances ball, paddle and score state at a fixed
//! rate, applies collision and scoring rules, and detects the win condition.
//! Clients only ever send paddle offsets; every game-state decision is made
//! here.
//!
//! ### State Broadcasting
//! Each tick's snapshot is serialized once and fanned out to every attached
//! connection. Delivery failures are isolated per connection and never
//! abort a broadcast or a session.
//!
//! ## Architecture Design
//!
//! Every session is an independent single-writer actor: all of its state
//! sits behind one per-session lock, and no lock or queue is ever shared
//! between sessions. The tick loop is a tokio task whose handle the session
//! stores and aborts synchronously on any transition out of `active`, so a
//! finished session can neither keep simulating nor keep broadcasting.
//!
//! ## Module Organization
//!
//! - [`registry`]: process-wide map from session identifier to session,
//!   injected into the gateway rather than held as a global.
//! - [`session`]: role bindings, lifecycle transitions, input routing and
//!   the tick loop for one session.
//! - [`simulation`]: the per-tick physics, from integration and wall
//!   bounces through paddle collision, scoring and win detection.
//! - [`broadcast`]: per-connection outbound channels and fan-out with
//!   per-member error isolation.
//! - [`gateway`]: WebSocket accept loop, frame parsing, and the guarantee
//!   of exactly one detach per connection.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::gateway::Gateway;
//! use server::registry::{SessionConfig, SessionRegistry};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = SessionRegistry::new(SessionConfig::default());
//!
//!     // Session creation is explicit; connections never create sessions
//!     let id = registry.create().await;
//!     println!("connect with ws://127.0.0.1:8080/ws?gameId={}", id);
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     Arc::new(Gateway::new(registry)).run(listener).await;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod gateway;
pub mod registry;
pub mod session;
pub mod simulation;
