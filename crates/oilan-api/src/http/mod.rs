//! HTTP/WebSocket layer for Oilan.
//!
//! Axum-based JSON API under `/api/v1/`, the `/ws/chat` realtime endpoint,
//! and a `/health` check. Callers are identified by a trusted header set by
//! the upstream gateway.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
