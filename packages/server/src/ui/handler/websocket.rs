//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    protocol::ClientEvent,
    relay::{ConnectionId, JoinOutcome},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Drive one connection for its whole lifetime.
///
/// The connection id is assigned here, at the transport boundary; the relay
/// never sees a connection until its first join request. Whatever way the
/// connection ends (clean close, read error, send failure), the disconnect
/// cleanup below runs exactly once.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn = ConnectionId::new();
    tracing::info!("New connection '{}'", conn);

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel through which the relay pushes events to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Forward relay events to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if ws_sender.send(Message::Text(event.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound frames to completion, one at a time
    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut registered = false;

        while let Some(msg) = ws_receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", conn, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Unparseable frame from '{}': {}", conn, e);
                            continue;
                        }
                    };

                    match event {
                        ClientEvent::Join { username } => {
                            // A registered entry is immutable for the life of
                            // the connection; repeated joins are ignored.
                            if registered {
                                tracing::debug!("'{}' sent join while registered, ignoring", conn);
                                continue;
                            }
                            let outcome =
                                state_clone.relay.join(conn, &username, tx.clone()).await;
                            registered = outcome == JoinOutcome::Joined;
                        }
                        ClientEvent::SendMessage { message } => {
                            state_clone.relay.send_message(conn, &message).await;
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", conn);
                    break;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", conn);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Covers both clean closes and transport-detected drops; a no-op for
    // connections that never completed a join.
    state.relay.disconnect(conn).await;
    tracing::info!("Connection '{}' cleaned up", conn);
}
