//! WebSocket connection loop.
//!
//! Runs the read/write loop for a single connected participant: inbound
//! text frames go through the router, outbound events drain from the
//! participant's queue. The relay is notified of the disconnect exactly
//! once, when the loop exits, whether by close frame, stream end, or
//! transport error.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::router;
use crate::service::RelayService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Registers the participant and lets the relay push the welcome into
///   the outbound queue before the first drain.
/// - Forwards queued [`crate::domain::ServerEvent`]s to the socket.
/// - Routes inbound text frames; other frame kinds are ignored.
pub async fn run_connection(socket: WebSocket, relay: Arc<RelayService>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sender, mut outbound) = mpsc::unbounded_channel();
    let client_id = relay.connect(sender).await;

    loop {
        tokio::select! {
            // Queued event for this participant
            event = outbound.recv() => {
                match event {
                    Some(event) => match serde_json::to_string(&event) {
                        Ok(json) => {
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(%client_id, error = %err, "failed to serialize outbound event");
                        }
                    },
                    // Sender dropped: the participant was deregistered.
                    None => break,
                }
            }
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        router::dispatch(&relay, client_id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%client_id, error = %err, "ws read error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    relay.disconnect(client_id).await;
    tracing::debug!(%client_id, "ws connection closed");
}
