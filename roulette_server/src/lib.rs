//! Signaling server that pairs strangers for one-to-one WebRTC sessions
//!
//! Clients connect over a WebSocket, ask to be matched, and are paired with
//! whoever has waited longest. Once paired, the server relays their session
//! offer, answer, ICE candidates and chat text to each other verbatim.
//!
//! # Layout
//!
//! - [`registry`], [`queue`], [`matcher`], [`relay`] - the matchmaking core
//! - [`lifecycle`] - applies one client event at a time to the core
//! - [`state`] - the shared, lock-guarded server state
//! - [`handler`] - axum routes and the WebSocket adapter
//!
//! # Protocol
//!
//! See [`roulette_protocol`] for the message catalogue. A typical session:
//!
//! ```text
//! A → {"type":"join"}                   A ← {"type":"searching"}
//! B → {"type":"join"}                   B ← {"type":"searching"}
//!                                       A ← {"type":"matched","partner":"<B>"}
//!                                       B ← {"type":"matched","partner":"<A>"}
//! A → {"type":"session-offer","payload":{..},"to":"<B>"}
//!                                       B ← {"type":"session-offer","payload":{..},"from":"<A>"}
//! A → {"type":"skip"}                   B ← {"type":"partner_left"}
//! ```
//!
//! # Example
//!
//! ```bash
//! PORT=3000 TURN_URL=turn:relay.example:3478 TURN_USERNAME=u TURN_CREDENTIAL=p \
//!   roulette-signaling
//!
//! curl http://127.0.0.1:3000/relay-config
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod matcher;
pub mod queue;
pub mod registry;
pub mod relay;
pub mod state;

pub use config::Config;
pub use error::SignalingError;
pub use handler::{AppState, router};
pub use lifecycle::{Event, Matchmaker, Notification};
pub use state::ServerState;
