//! WebSocket connection handling

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::AppState;

use super::protocol::{ClientMessage, ServerMessage};
use super::registry::ConnectionHandle;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection from registration to removal
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let send_timeout = state.push.send_timeout;

    let (handle, mut outbound) = ConnectionHandle::new(state.push.send_buffer);
    let connection_id = handle.id();
    if !state.connections.register(Arc::clone(&handle)) {
        warn!(connection = %connection_id, "Connection closed before registration");
        return;
    }

    info!(connection = %connection_id, "WebSocket client connected");

    let connected = ServerMessage::connected();
    let ack = bounded_write(
        send_json(&mut sender, &connected),
        send_timeout,
        &handle,
    );
    if let Err(e) = ack.await {
        warn!(connection = %connection_id, "Failed to send connection ack: {}", e);
    } else {
        loop {
            tokio::select! {
                biased;

                // Evicted by the broadcaster
                _ = handle.closed() => {
                    debug!(connection = %connection_id, "Connection closed by server");
                    let close = sender.send(Message::Close(None));
                    if tokio::time::timeout(send_timeout, close).await.is_err() {
                        debug!(connection = %connection_id, "Close frame timed out");
                    }
                    break;
                }

                // Frames queued by the broadcaster
                frame = outbound.recv() => {
                    let Some(frame) = frame else { break };
                    let write = async {
                        sender
                            .send(Message::Text(frame.to_string()))
                            .await
                            .map_err(|e| e.to_string())
                    };
                    if let Err(e) = bounded_write(write, send_timeout, &handle).await {
                        warn!(connection = %connection_id, "WebSocket send failed: {}", e);
                        break;
                    }
                }

                // Messages from the client
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let reply = handle_text_message(&text, &state, &mut sender);
                            if let Err(e) = bounded_write(reply, send_timeout, &handle).await {
                                warn!(connection = %connection_id, "WebSocket send failed: {}", e);
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            debug!(connection = %connection_id, "WebSocket client sent close frame");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Ping frames are answered by the transport; ignore binary and pong
                        }
                        Some(Err(e)) => {
                            warn!(connection = %connection_id, "WebSocket error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
    }

    // Dropping both halves here releases the socket
    state.connections.remove(connection_id);
    if handle.close() {
        info!(connection = %connection_id, "WebSocket client disconnected");
    } else {
        info!(connection = %connection_id, "WebSocket client evicted");
    }
}

/// Run a socket write that gives up after `limit` or once the handle closes
///
/// A client that stops reading leaves the write pending forever, so every
/// write on the connection goes through here.
async fn bounded_write<F>(
    write: F,
    limit: Duration,
    handle: &ConnectionHandle,
) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    tokio::select! {
        result = tokio::time::timeout(limit, write) => match result {
            Ok(written) => written,
            Err(_) => Err(format!("write timed out after {}ms", limit.as_millis())),
        },
        _ = handle.closed() => Err("connection closed by server".to_string()),
    }
}

/// Handle a text message from the client
///
/// Malformed and unrecognized messages are logged and ignored; only a failed
/// send is reported to the caller.
async fn handle_text_message<S>(
    text: &str,
    state: &AppState,
    sender: &mut S,
) -> Result<(), String>
where
    S: SinkExt<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Ignoring malformed WebSocket message: {}", e);
            return Ok(());
        }
    };

    match client_msg {
        ClientMessage::Ping => {
            let pong = ServerMessage::Pong {
                timestamp: state.updates.now_millis(),
            };
            send_json(sender, &pong).await?;
        }
        ClientMessage::Unknown => {
            debug!("Ignoring unrecognized WebSocket message: {}", text);
        }
    }

    Ok(())
}

/// Helper to serialize and send a JSON message
async fn send_json<S, T>(sender: &mut S, msg: &T) -> Result<(), String>
where
    S: SinkExt<Message> + Unpin,
    S::Error: std::fmt::Display,
    T: Serialize,
{
    let json = serde_json::to_string(msg).map_err(|e| format!("Serialize error: {}", e))?;
    sender
        .send(Message::Text(json))
        .await
        .map_err(|e| format!("Send error: {}", e))
}
