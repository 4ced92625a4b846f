//! Session lifecycle
//!
//! [`Matchmaker`] owns the registry and the waiting queue and is their only
//! mutator. [`Matchmaker::handle`] applies one event to completion, matcher
//! pass included, and returns the notifications it produced. It performs no
//! I/O, so the transport decides how and when those notifications are sent.

use crate::error::SignalingError;
use crate::matcher::{self, MatchOutcome};
use crate::queue::WaitingQueue;
use crate::registry::{ConnectionState, Registry};
use crate::relay;
use roulette_protocol::{ClientMessage, Handle, RelayPayload, ServerMessage};
use serde::Serialize;
use tracing::{debug, info};

/// A message addressed to one handle
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub to: Handle,
    pub message: ServerMessage,
}

impl Notification {
    fn new(to: Handle, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Inbound events, one per transport occurrence
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Transport connection opened
    Connect,
    Join,
    Skip,
    /// Explicit stop from the client
    Leave,
    /// Transport connection lost
    Disconnect,
    Relay { to: Handle, payload: RelayPayload },
}

impl From<ClientMessage> for Event {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Join => Event::Join,
            ClientMessage::Skip => Event::Skip,
            ClientMessage::Leave => Event::Leave,
            ClientMessage::SessionOffer { payload, to } => Event::Relay {
                to,
                payload: RelayPayload::Offer(payload),
            },
            ClientMessage::SessionAnswer { payload, to } => Event::Relay {
                to,
                payload: RelayPayload::Answer(payload),
            },
            ClientMessage::Candidate { payload, to } => Event::Relay {
                to,
                payload: RelayPayload::Candidate(payload),
            },
            ClientMessage::Chat { text, to } => Event::Relay {
                to,
                payload: RelayPayload::Chat(text),
            },
        }
    }
}

/// Snapshot of matchmaking occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub connected: usize,
    pub queued: usize,
    pub paired: usize,
}

#[derive(Debug, Default)]
pub struct Matchmaker {
    registry: Registry,
    queue: WaitingQueue,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `event` for `handle` and collect the resulting notifications.
    ///
    /// Failures are absorbed: an event that cannot apply is a no-op.
    pub fn handle(&mut self, handle: Handle, event: Event) -> Vec<Notification> {
        let mut out = Vec::new();
        let result = match event {
            Event::Connect => self.registry.register(handle),
            Event::Join => self.join(handle, &mut out),
            Event::Skip => self.skip(handle, &mut out),
            Event::Leave | Event::Disconnect => {
                self.leave(handle, &mut out);
                Ok(())
            }
            Event::Relay { to, payload } => {
                let kind = payload.kind();
                relay::relay(&self.registry, handle, to, payload).map(|note| {
                    debug!(from = %handle, %to, kind, "Relayed");
                    out.push(note);
                })
            }
        };
        if let Err(e) = result {
            debug!(%handle, "Event ignored: {}", e);
        }
        out
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn stats(&self) -> Stats {
        Stats {
            connected: self.registry.len(),
            queued: self.queue.size(),
            paired: self.registry.paired_count(),
        }
    }

    fn join(&mut self, handle: Handle, out: &mut Vec<Notification>) -> Result<(), SignalingError> {
        self.enqueue(handle)?;
        info!(%handle, "Searching");
        out.push(Notification::new(handle, ServerMessage::Searching));
        self.run_matcher(out);
        Ok(())
    }

    fn skip(&mut self, handle: Handle, out: &mut Vec<Notification>) -> Result<(), SignalingError> {
        let partner = self.registry.clear_pairing(handle)?;
        info!(%handle, %partner, "Skipped partner");
        out.push(Notification::new(partner, ServerMessage::PartnerLeft));
        self.enqueue(partner)?;
        self.enqueue(handle)?;
        out.push(Notification::new(handle, ServerMessage::Searching));
        self.run_matcher(out);
        Ok(())
    }

    fn leave(&mut self, handle: Handle, out: &mut Vec<Notification>) {
        match self.registry.state_of(handle) {
            None => return,
            Some(ConnectionState::Paired(partner)) => {
                if self.registry.clear_pairing(handle).is_ok() {
                    out.push(Notification::new(partner, ServerMessage::PartnerLeft));
                    if let Err(e) = self.enqueue(partner) {
                        debug!(%partner, "Could not requeue former partner: {}", e);
                    }
                }
            }
            Some(ConnectionState::Queued) => {
                self.queue.remove(handle);
            }
            Some(ConnectionState::Idle) => {}
        }
        self.registry.unregister(handle);
        info!(%handle, "Left");
        self.run_matcher(out);
    }

    /// Mark `handle` queued and append it, keeping registry and queue in step
    fn enqueue(&mut self, handle: Handle) -> Result<(), SignalingError> {
        self.registry.mark_queued(handle)?;
        if let Err(e) = self.queue.enqueue(handle, &self.registry) {
            self.registry.mark_idle(handle)?;
            return Err(e);
        }
        Ok(())
    }

    fn run_matcher(&mut self, out: &mut Vec<Notification>) {
        for outcome in matcher::run(&mut self.queue, &mut self.registry) {
            if let MatchOutcome::Paired(a, b) = outcome {
                out.push(Notification::new(a, ServerMessage::Matched { partner: b }));
                out.push(Notification::new(b, ServerMessage::Matched { partner: a }));
            }
        }
    }
}
