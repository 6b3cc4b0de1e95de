//! Dialog orchestration and the realtime session loop.
//!
//! `ChatOrchestrator` is the single entry point for starting dialogs and
//! submitting turns. `channel` drives one persistent connection on top of it.

pub mod channel;
pub mod orchestrator;

pub use channel::{
    ChannelSettings, CloseReason, FrameTransport, SessionReport, TransportError,
    run_session,
};
pub use orchestrator::{ChatOrchestrator, TurnPolicy};
