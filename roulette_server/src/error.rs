//! Error types for the signaling server

use roulette_protocol::Handle;
use thiserror::Error;

/// Failures inside the matchmaking core.
///
/// None of these reach a client; the lifecycle absorbs each one as a
/// no-op or a dropped message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalingError {
    /// Handle is absent from the registry
    #[error("Unknown handle {0}")]
    NotFound(Handle),

    /// Fewer handles queued than the operation needs
    #[error("Waiting queue is empty")]
    EmptyQueue,

    /// Join while already queued or paired
    #[error("Handle {0} is already queued or paired")]
    DuplicateJoin(Handle),

    /// Declared recipient does not match the live partner
    #[error("Handle {sender} may not relay to {declared}")]
    InvalidRelayTarget { sender: Handle, declared: Handle },

    /// Operation requires a pairing that does not exist
    #[error("Handle {0} is not paired")]
    NotPaired(Handle),

    /// Handle registered twice
    #[error("Handle {0} is already registered")]
    AlreadyRegistered(Handle),
}

/// Errors from client requests
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// Connection was closed
    #[error("Connection closed")]
    Close,

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported message type
    #[error("Unsupported message type")]
    UnsupportedType,

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

/// Errors loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// PORT is not a valid port number
    #[error("Invalid PORT environment variable: {0}")]
    InvalidPort(String),

    /// CLIENT_URL is `*`, which cannot be combined with credentialed CORS
    #[error("CLIENT_URL must be an explicit origin, not `*`")]
    WildcardOrigin,
}
