//! WebSocket handler for realtime chat.
//!
//! `/ws/chat` upgrades the connection, opens a fresh dialog for the caller and
//! runs the session loop from `oilan-core` over the socket. Each inbound text
//! frame is one user turn; each outbound text frame is one reply (or the
//! apology when generation fails).

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use oilan_core::chat::{FrameTransport, TransportError, run_session};
use oilan_types::ids::UserId;

use crate::http::extractors::identity::Identity;
use crate::state::AppState;

/// Upgrade an HTTP request to a realtime chat connection.
///
/// The identity header is checked before the upgrade; a missing or invalid
/// id refuses the upgrade with 401.
pub async fn ws_chat(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, user_id))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState, user_id: UserId) {
    let mut transport = WsTransport::new(socket);
    let report = run_session(
        state.orchestrator.as_ref(),
        user_id,
        &mut transport,
        &state.channel,
    )
    .await;

    tracing::debug!(
        user_id = %user_id,
        dialog_id = ?report.dialog_id,
        turns = report.turns,
        failed_turns = report.failed_turns,
        "WebSocket connection closed"
    );
}

/// [`FrameTransport`] over an axum WebSocket.
///
/// Binary, ping and pong frames are skipped; a close frame ends the stream.
pub struct WsTransport {
    sender: SplitSink<WebSocket, Message>,
    receiver: SplitStream<WebSocket>,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sender, receiver) = socket.split();
        Self { sender, receiver }
    }
}

impl FrameTransport for WsTransport {
    async fn recv_text(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.receiver.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_string())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Err(err)) => return Err(TransportError::Receive(err.to_string())),
                // Protocol frames are answered by axum/tungstenite
                Some(Ok(_)) => {}
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sender
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
