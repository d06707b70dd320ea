//! Connection handlers for the Duet server.
//!
//! This module wires WebSocket connections into the session manager and
//! serves the ICE configuration and health endpoints.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use duet_core::{ConnectionId, EventSink, RelayKind, SessionManager};
use duet_protocol::{codec, ClientEvent};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// The matchmaking and relay core.
    pub manager: SessionManager,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            manager: SessionManager::new(),
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .route("/ice-servers", get(ice_servers_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Duet server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.manager.stats();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": stats.connections,
        "waiting": stats.waiting,
        "sessions": stats.sessions,
    }))
}

/// ICE configuration handler.
///
/// Returns the configured descriptor list verbatim; the server never
/// computes or validates credentials.
async fn ice_servers_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(state.config.ice_servers.clone())
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    if state.manager.stats().connections >= state.config.limits.max_connections {
        warn!("Rejecting connection: at capacity");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
        .into_response()
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    let connection_id = ConnectionId::generate();
    debug!(connection = %connection_id, "WebSocket connected");

    // Register the outbound sink before any event can be dispatched.
    let (sink, mut outbound) = EventSink::new();
    state.manager.register(connection_id.clone(), sink);

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();
    let max_event_size = state.config.limits.max_event_size;

    loop {
        tokio::select! {
            biased;

            // Deliver events queued for this connection
            Some(event) = outbound.recv() => {
                match codec::encode(&event) {
                    Ok(text) => {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(connection = %connection_id, error = %e, "Failed to encode event");
                        metrics::record_error("encode");
                    }
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > max_event_size {
                            warn!(
                                connection = %connection_id,
                                size = text.len(),
                                "Dropping oversized event"
                            );
                            metrics::record_error("oversized");
                            continue;
                        }
                        match codec::decode(&text) {
                            Ok(event) => dispatch(event, &connection_id, &state),
                            Err(e) => {
                                warn!(connection = %connection_id, error = %e, "Dropping malformed event");
                                metrics::record_error("malformed");
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!(connection = %connection_id, "Dropping binary frame");
                        metrics::record_error("binary");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Full teardown: leave any session, drop any waiting entry, retire the id.
    state.manager.disconnect(&connection_id);
    metrics::update_session_gauges(&state.manager.stats());

    debug!(connection = %connection_id, "WebSocket disconnected");
}

/// Dispatch a decoded client event to the session manager.
fn dispatch(event: ClientEvent, connection_id: &ConnectionId, state: &AppState) {
    match event {
        ClientEvent::FindMatch => {
            debug!(connection = %connection_id, "Match request");
            metrics::record_match_request();
            state.manager.request_match(connection_id);
            metrics::update_session_gauges(&state.manager.stats());
        }

        ClientEvent::ChatMessage { message, peer_id } => {
            relay(state, connection_id, &peer_id, RelayKind::Chat, message);
        }

        ClientEvent::Offer { offer, peer_id } => {
            relay(state, connection_id, &peer_id, RelayKind::Offer, offer);
        }

        ClientEvent::Answer { answer, peer_id } => {
            relay(state, connection_id, &peer_id, RelayKind::Answer, answer);
        }

        ClientEvent::Candidate { candidate, peer_id } => {
            relay(state, connection_id, &peer_id, RelayKind::Candidate, candidate);
        }

        ClientEvent::LeaveChat => {
            debug!(connection = %connection_id, "Leave request");
            state.manager.leave(connection_id);
            metrics::update_session_gauges(&state.manager.stats());
        }
    }
}

/// Forward a payload to the claimed partner, recording the outcome.
fn relay(
    state: &AppState,
    sender: &ConnectionId,
    recipient: &str,
    kind: RelayKind,
    payload: serde_json::Value,
) {
    let recipient = ConnectionId::new(recipient);
    let delivered = state.manager.relay(sender, &recipient, kind, payload);
    metrics::record_relay(kind.event_kind().as_str(), delivered);
}
