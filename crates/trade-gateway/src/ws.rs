//! WebSocket endpoint bridging sockets to relay connections.
//!
//! Outbound delivery is decoupled from inbound handling: a writer task
//! drains the connection's event queue into the socket while the main
//! task reads frames, so a slow reader never blocks dispatch.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use trade_relay::Relay;
use trade_types::{ClientEvent, ServerEvent};

use crate::config::GatewayConfig;

#[derive(Clone)]
struct AppState {
    relay: Relay,
    config: Arc<GatewayConfig>,
}

/// Build the gateway router. The relay is shared by every connection.
pub fn router(relay: Relay, config: Arc<GatewayConfig>) -> Router {
    Router::new()
        .route("/trade", get(upgrade))
        .with_state(AppState { relay, config })
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state.relay, state.config))
}

/// Drive one socket for the lifetime of its relay connection.
async fn handle_socket(socket: WebSocket, relay: Relay, config: Arc<GatewayConfig>) {
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerEvent>(config.relay.outbox_capacity);
    let id = relay.connect(outbox_tx);
    info!(connection = %id, "websocket connection opened");

    let (mut sink, mut stream) = socket.split();

    // Writer: relay event queue → socket frames.
    let writer = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(connection = %id, error = %e, "unserializable event dropped");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader: socket frames → relay events, until close or idle timeout.
    loop {
        let frame = match timeout(config.idle_timeout, stream.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                debug!(connection = %id, error = %e, "websocket read error");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                info!(connection = %id, "closing idle connection");
                break;
            }
        };

        match frame {
            Message::Text(text) => handle_frame(&relay, id, text.as_ref()),
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => handle_frame(&relay, id, text),
                Err(_) => warn!(connection = %id, "non-UTF-8 binary frame ignored"),
            },
            // Pings are answered by the protocol layer; pongs need no
            // action.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                debug!(connection = %id, "close frame received");
                break;
            }
        }
    }

    relay.disconnect(id);
    writer.abort();
    info!(connection = %id, "websocket connection closed");
}

/// Parse and apply one inbound frame. All failures stay local to this
/// connection; the relay has already answered protocol-level rejections.
fn handle_frame(relay: &Relay, id: trade_types::ConnectionId, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(connection = %id, error = %e, "unparseable frame ignored");
            return;
        }
    };
    if let Err(e) = relay.handle_event(id, event) {
        debug!(connection = %id, error = %e, "event rejected");
    }
}
