//! WebSocket and HTTP handlers for the signaling server
//!
//! Translates socket frames into lifecycle events and writes the resulting
//! notifications back out. Each socket is one handle for its whole lifetime.

use crate::config::Config;
use crate::error::ClientRequestError;
use crate::lifecycle::Event;
use crate::state::ServerState;
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderValue, Method, header},
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use roulette_protocol::ClientMessage;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

/// Shared state for the router
#[derive(Debug, Clone)]
pub struct AppState {
    pub server: ServerState,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            server: ServerState::new(),
            config: Arc::new(config),
        }
    }
}

/// Build the full router: signaling socket, relay config, and health checks
pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter(|o| {
            // AllowOrigin::list panics on a wildcard
            if o.as_str() == "*" {
                warn!("Ignoring wildcard CORS origin");
                return false;
            }
            true
        })
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(origins));

    Router::new()
        .route("/", get(info_page))
        .route("/health", get(|| async { "OK" }))
        .route("/stats", get(stats))
        .route("/relay-config", get(relay_config))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn info_page() -> &'static str {
    "Roulette Signaling Server\n\
     \n\
     Endpoints:\n\
     - GET /ws - WebSocket signaling\n\
     - GET /relay-config - STUN/TURN servers for clients\n\
     - GET /stats - Connected, queued and paired counts\n\
     - GET /health - Health check\n\
     \n\
     Protocol:\n\
     1. Connect to /ws and send {\"type\":\"join\"}\n\
     2. Wait for {\"type\":\"matched\",\"partner\":\"<uuid>\"}\n\
     3. Exchange session-offer, session-answer, candidate and chat messages \
        addressed with \"to\"\n\
     4. Send {\"type\":\"skip\"} for a new partner or {\"type\":\"leave\"} to stop\n"
}

async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.server.stats())
}

async fn relay_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.relay_config())
}

/// WebSocket upgrade handler
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.server))
}

/// Parse one inbound frame.
///
/// Returns `Ok(None)` for control frames that carry no request.
fn parse_request(message: Message) -> Result<Option<ClientMessage>, ClientRequestError> {
    match message {
        Message::Text(text) => Ok(Some(ClientMessage::from_str(text.as_str())?)),
        Message::Binary(_) => Err(ClientRequestError::UnsupportedType),
        Message::Close(_) => Err(ClientRequestError::Close),
        Message::Ping(_) | Message::Pong(_) => Ok(None),
    }
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (handle, mut outbox) = state.connect();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut left = false;

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                let frame = match frame {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        let e = ClientRequestError::WebSocket(e.to_string());
                        warn!(%handle, "{}", e);
                        break;
                    }
                    None => break,
                };
                match parse_request(frame) {
                    Ok(Some(request)) => {
                        let leaving = request == ClientMessage::Leave;
                        state.dispatch(handle, Event::from(request));
                        if leaving {
                            left = true;
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(ClientRequestError::Close) => break,
                    Err(e) => warn!(%handle, "Ignoring frame: {}", e),
                }
            }

            Some(message) = outbox.recv() => {
                if let Err(e) = ws_tx.send(Message::Text(message.to_string().into())).await {
                    debug!(%handle, "Send failed: {}", e);
                    break;
                }
            }
        }
    }

    if !left {
        state.dispatch(handle, Event::Disconnect);
    }
    info!(%handle, "Connection closed");
}
