//! Server state management
//!
//! Holds the matchmaker and the outbound channel of every connected handle
//! behind one lock. Each inbound event runs to completion under that lock,
//! so no event observes a half-applied queue or registry, and a pairing
//! decision spanning two handles is never interleaved with another event.

use crate::lifecycle::{Event, Matchmaker, Notification, Stats};
use roulette_protocol::{Handle, ServerMessage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Messages buffered per handle before further ones are dropped
pub const OUTBOX_CAPACITY: usize = 64;

/// Receiving end of a handle's outbound messages
pub type Outbox = mpsc::Receiver<ServerMessage>;

#[derive(Debug, Default)]
struct InnerState {
    matchmaker: Matchmaker,
    /// Map of handle -> outbound sender
    peers: HashMap<Handle, mpsc::Sender<ServerMessage>>,
}

impl InnerState {
    fn deliver(&mut self, notifications: Vec<Notification>) {
        for Notification { to, message } in notifications {
            match self.peers.get(&to) {
                Some(sender) => match sender.try_send(message) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(%to, "Outbound channel full, message dropped");
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(%to, "Outbound channel closed, message dropped");
                    }
                },
                None => debug!(%to, "No outbound channel, message dropped"),
            }
        }
    }
}

/// The main server state, cheap to clone
#[derive(Debug, Default, Clone)]
pub struct ServerState {
    inner: Arc<Mutex<InnerState>>,
}

impl ServerState {
    /// Create a new server state handle
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InnerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new connection.
    ///
    /// Returns its handle and the receiver for messages addressed to it.
    pub fn connect(&self) -> (Handle, Outbox) {
        let handle = Handle::new_random();
        let (sender, receiver) = mpsc::channel(OUTBOX_CAPACITY);

        let mut state = self.lock();
        state.peers.insert(handle, sender);
        let notifications = state.matchmaker.handle(handle, Event::Connect);
        state.deliver(notifications);
        info!(%handle, "Connected");

        (handle, receiver)
    }

    /// Apply one event for `handle` and deliver what it produced
    pub fn dispatch(&self, handle: Handle, event: Event) {
        let mut state = self.lock();
        let terminal = matches!(event, Event::Leave | Event::Disconnect);
        let notifications = state.matchmaker.handle(handle, event);
        if terminal {
            state.peers.remove(&handle);
        }
        state.deliver(notifications);
    }

    pub fn stats(&self) -> Stats {
        self.lock().matchmaker.stats()
    }

    pub fn is_connected(&self, handle: Handle) -> bool {
        self.lock().matchmaker.registry().is_active(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_protocol::RelayPayload;
    use serde_json::json;

    #[test]
    fn notifications_reach_outboxes() {
        let state = ServerState::new();
        let (a, mut a_rx) = state.connect();
        let (b, mut b_rx) = state.connect();

        state.dispatch(a, Event::Join);
        state.dispatch(b, Event::Join);

        assert_eq!(a_rx.try_recv().unwrap(), ServerMessage::Searching);
        assert_eq!(a_rx.try_recv().unwrap(), ServerMessage::Matched { partner: b });
        assert_eq!(b_rx.try_recv().unwrap(), ServerMessage::Searching);
        assert_eq!(b_rx.try_recv().unwrap(), ServerMessage::Matched { partner: a });

        state.dispatch(
            a,
            Event::Relay {
                to: b,
                payload: RelayPayload::Answer(json!({"sdp": "answer"})),
            },
        );
        assert_eq!(
            b_rx.try_recv().unwrap(),
            ServerMessage::SessionAnswer {
                payload: json!({"sdp": "answer"}),
                from: a
            }
        );
    }

    #[test]
    fn disconnect_releases_the_handle() {
        let state = ServerState::new();
        let (a, _a_rx) = state.connect();
        let (b, _b_rx) = state.connect();
        state.dispatch(a, Event::Join);
        state.dispatch(b, Event::Join);

        state.dispatch(a, Event::Disconnect);
        assert!(!state.is_connected(a));
        assert!(state.is_connected(b));

        let stats = state.stats();
        assert_eq!(stats.connected, 1);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.paired, 0);
    }

    #[test]
    fn partner_left_is_delivered_on_disconnect() {
        let state = ServerState::new();
        let (a, _a_rx) = state.connect();
        let (b, mut b_rx) = state.connect();
        state.dispatch(a, Event::Join);
        state.dispatch(b, Event::Join);
        state.dispatch(a, Event::Disconnect);

        let received: Vec<ServerMessage> = std::iter::from_fn(|| b_rx.try_recv().ok()).collect();
        assert_eq!(received.last(), Some(&ServerMessage::PartnerLeft));
    }

    #[test]
    fn slow_reader_backlog_is_capped() {
        let state = ServerState::new();
        let (a, _a_rx) = state.connect();
        let (b, mut b_rx) = state.connect();
        state.dispatch(a, Event::Join);
        state.dispatch(b, Event::Join);

        for i in 0..OUTBOX_CAPACITY * 2 {
            state.dispatch(
                a,
                Event::Relay {
                    to: b,
                    payload: RelayPayload::Chat(format!("msg {i}")),
                },
            );
        }

        let received: Vec<ServerMessage> = std::iter::from_fn(|| b_rx.try_recv().ok()).collect();
        assert_eq!(received.len(), OUTBOX_CAPACITY);
        assert_eq!(received[1], ServerMessage::Matched { partner: a });
        // Overflow is dropped, the connection stays up.
        assert!(state.is_connected(b));

        state.dispatch(
            a,
            Event::Relay {
                to: b,
                payload: RelayPayload::Chat("after drain".into()),
            },
        );
        assert_eq!(
            b_rx.try_recv().unwrap(),
            ServerMessage::Chat {
                text: "after drain".into(),
                from: a
            }
        );
    }
}
