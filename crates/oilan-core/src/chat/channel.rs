//! Realtime channel: one persistent text connection bound to one dialog.
//!
//! The session loop is transport-agnostic. The API crate adapts an axum
//! WebSocket to [`FrameTransport`]; tests drive it with a scripted transport.
//!
//! Lifecycle: `Connected` (dialog started, greeting sent) → `Active` (one
//! frame in, one frame out, strictly sequential) → `Closed`.

use std::fmt;

use oilan_types::config::ChatConfig;
use oilan_types::error::ChatError;
use oilan_types::ids::{DialogId, UserId};
use tracing::{debug, info, warn};

use super::orchestrator::ChatOrchestrator;
use crate::dialog::store::DialogStore;
use crate::generation::backend::GenerationBackend;

/// Errors raised by a frame transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("receive failed: {0}")]
    Receive(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// A duplex text-frame connection.
pub trait FrameTransport: Send {
    /// Next inbound text frame. `Ok(None)` means the peer closed the stream.
    fn recv_text(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Send one outbound text frame.
    fn send_text(
        &mut self,
        text: String,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

/// Fixed texts used by a realtime session.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Title of the dialog opened for each connection.
    pub title: String,
    pub greeting: String,
    pub apology: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for ChannelSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            title: config.websocket_title.clone(),
            greeting: config.greeting.clone(),
            apology: config.apology.clone(),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the connection.
    ClientClosed,
    /// Reading the next frame failed.
    ReadFailed(String),
    /// Sending a frame failed.
    WriteFailed(String),
    /// The orchestrator returned a non-generation error.
    Fatal(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ClientClosed => write!(f, "client closed"),
            CloseReason::ReadFailed(e) => write!(f, "read failed: {e}"),
            CloseReason::WriteFailed(e) => write!(f, "write failed: {e}"),
            CloseReason::Fatal(e) => write!(f, "fatal: {e}"),
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// `None` when the dialog could not be started.
    pub dialog_id: Option<DialogId>,
    /// Turns answered with an assistant reply.
    pub turns: u32,
    /// Turns answered with the apology frame.
    pub failed_turns: u32,
    pub close_reason: CloseReason,
}

/// Drive one connection until it closes.
///
/// A generation failure sends the apology frame and keeps the connection
/// open. Any other orchestrator error, and any transport error, closes it.
/// The next frame is not read until the previous turn has been answered, so
/// a turn in flight when the peer disconnects still completes and persists.
pub async fn run_session<S, G, T>(
    orchestrator: &ChatOrchestrator<S, G>,
    user_id: UserId,
    transport: &mut T,
    settings: &ChannelSettings,
) -> SessionReport
where
    S: DialogStore,
    G: GenerationBackend,
    T: FrameTransport,
{
    let mut report = SessionReport {
        dialog_id: None,
        turns: 0,
        failed_turns: 0,
        close_reason: CloseReason::ClientClosed,
    };

    let dialog = match orchestrator.start_dialog(user_id, &settings.title).await {
        Ok(dialog) => dialog,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Could not open dialog for realtime session");
            report.close_reason = CloseReason::Fatal(e.to_string());
            return report;
        }
    };
    report.dialog_id = Some(dialog.id);
    info!(dialog_id = %dialog.id, user_id = %user_id, "Realtime session connected");

    if let Err(e) = transport.send_text(settings.greeting.clone()).await {
        report.close_reason = CloseReason::WriteFailed(e.to_string());
        return report;
    }

    loop {
        let frame = match transport.recv_text().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                report.close_reason = CloseReason::ClientClosed;
                break;
            }
            Err(e) => {
                report.close_reason = CloseReason::ReadFailed(e.to_string());
                break;
            }
        };
        debug!(dialog_id = %dialog.id, len = frame.len(), "Frame received");

        let outbound = match orchestrator.post_turn(dialog.id, user_id, &frame).await {
            Ok(reply) => {
                report.turns += 1;
                reply.content
            }
            Err(ChatError::Generation(e)) => {
                warn!(dialog_id = %dialog.id, error = %e, "Turn failed, sending apology");
                report.failed_turns += 1;
                settings.apology.clone()
            }
            Err(e) => {
                warn!(dialog_id = %dialog.id, error = %e, "Closing realtime session");
                report.close_reason = CloseReason::Fatal(e.to_string());
                break;
            }
        };

        if let Err(e) = transport.send_text(outbound).await {
            report.close_reason = CloseReason::WriteFailed(e.to_string());
            break;
        }
    }

    info!(
        dialog_id = %dialog.id,
        turns = report.turns,
        failed_turns = report.failed_turns,
        reason = %report.close_reason,
        "Realtime session closed"
    );
    report
}
