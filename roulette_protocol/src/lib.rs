//! Wire protocol for the roulette signaling server
//!
//! Messages travel as JSON text frames, internally tagged on `"type"`.
//!
//! ## Client → server
//!
//! - `{"type": "join"}` - enter the waiting queue
//! - `{"type": "skip"}` - drop the current partner and search again
//! - `{"type": "leave"}` - stop entirely
//! - `{"type": "session-offer", "payload": ..., "to": "<uuid>"}`
//! - `{"type": "session-answer", "payload": ..., "to": "<uuid>"}`
//! - `{"type": "candidate", "payload": ..., "to": "<uuid>"}`
//! - `{"type": "chat", "text": "...", "to": "<uuid>"}`
//!
//! ## Server → client
//!
//! - `{"type": "searching"}`
//! - `{"type": "matched", "partner": "<uuid>"}`
//! - `{"type": "partner_left"}`
//! - the four relay messages above, with `"from"` in place of `"to"`
//!
//! Handshake payloads are carried as arbitrary JSON and are never inspected.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier for one connection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub Uuid);

impl Handle {
    /// Allocate a fresh random handle
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for Handle {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Handle {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Handle)
    }
}

/// Requests sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join,
    #[serde(rename = "skip")]
    Skip,
    #[serde(rename = "leave")]
    Leave,
    #[serde(rename = "session-offer")]
    SessionOffer { payload: serde_json::Value, to: Handle },
    #[serde(rename = "session-answer")]
    SessionAnswer { payload: serde_json::Value, to: Handle },
    #[serde(rename = "candidate")]
    Candidate { payload: serde_json::Value, to: Handle },
    #[serde(rename = "chat")]
    Chat { text: String, to: Handle },
}

impl FromStr for ClientMessage {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Notifications pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "searching")]
    Searching,
    #[serde(rename = "matched")]
    Matched { partner: Handle },
    #[serde(rename = "partner_left")]
    PartnerLeft,
    #[serde(rename = "session-offer")]
    SessionOffer {
        payload: serde_json::Value,
        from: Handle,
    },
    #[serde(rename = "session-answer")]
    SessionAnswer {
        payload: serde_json::Value,
        from: Handle,
    },
    #[serde(rename = "candidate")]
    Candidate {
        payload: serde_json::Value,
        from: Handle,
    },
    #[serde(rename = "chat")]
    Chat { text: String, from: Handle },
}

impl FromStr for ServerMessage {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A payload forwarded verbatim between paired handles
#[derive(Debug, Clone, PartialEq)]
pub enum RelayPayload {
    Offer(serde_json::Value),
    Answer(serde_json::Value),
    Candidate(serde_json::Value),
    Chat(String),
}

impl RelayPayload {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            RelayPayload::Offer(_) => "session-offer",
            RelayPayload::Answer(_) => "session-answer",
            RelayPayload::Candidate(_) => "candidate",
            RelayPayload::Chat(_) => "chat",
        }
    }

    /// Tag the payload with its sender for delivery
    pub fn into_server_message(self, from: Handle) -> ServerMessage {
        match self {
            RelayPayload::Offer(payload) => ServerMessage::SessionOffer { payload, from },
            RelayPayload::Answer(payload) => ServerMessage::SessionAnswer { payload, from },
            RelayPayload::Candidate(payload) => ServerMessage::Candidate { payload, from },
            RelayPayload::Chat(text) => ServerMessage::Chat { text, from },
        }
    }
}
