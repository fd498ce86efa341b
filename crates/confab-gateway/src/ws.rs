// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler binding one connection to one session agent.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "userMessage", "content": "What's the weather?"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "status", "content": "Connected to confab ✅"}
//! {"type": "assistantReply", "content": "full reply text"}
//! {"type": "error", "content": "failure description"}
//! ```
//!
//! Requests without a WebSocket upgrade intent are rejected by the
//! [`WebSocketUpgrade`] extractor with a client error before any session
//! state is touched.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use confab_agent::AgentCommand;
use confab_core::ServerEvent;

use crate::server::GatewayState;

/// WebSocket upgrade handler for `/agents/{session}`.
///
/// The session id is the opaque path segment chosen by the client; it is
/// stable across reconnects and routes to the same agent.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, session, state))
}

/// Handle an individual WebSocket connection.
///
/// Attaches to the session's agent, then runs two halves:
/// 1. Sender task: forwards agent frames to the socket, closing it when
///    the agent drops the outbound handle (turn fault path)
/// 2. Receiver loop: forwards raw text frames into the agent's mailbox
async fn handle_socket(socket: WebSocket, session: String, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let agent = state.registry.handle_for(&session);

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEvent>(64);
    if agent
        .send(AgentCommand::Attach {
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        tracing::error!(session = %session, "failed to attach to session agent");
        return;
    }

    // Forward agent frames to the socket.
    let sender_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode outbound frame");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        // The agent dropped the connection (or it is already gone):
        // close the socket so the client sees a clean teardown.
        let _ = ws_sender.close().await;
    });

    // Read frames from the client until the stream closes.
    while let Some(Ok(message)) = ws_receiver.next().await {
        match message {
            Message::Text(text) => {
                if agent
                    .send(AgentCommand::Frame {
                        payload: text.to_string(),
                    })
                    .await
                    .is_err()
                {
                    tracing::error!(session = %session, "session agent mailbox closed");
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping/pong (handled by the protocol layer)
        }
    }

    // No persisted-state cleanup on close; the ledger stays durable for
    // the next connection under the same session id.
    let _ = agent.send(AgentCommand::Detach).await;
    sender_task.abort();
}
