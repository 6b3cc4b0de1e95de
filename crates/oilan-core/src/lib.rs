//! Core business logic for Oilan.
//!
//! Defines the storage and generation ports (`DialogStore`,
//! `GenerationBackend`) plus the services built on top of them: the
//! `ChatOrchestrator` and the realtime channel session loop.
//!
//! This crate depends only on oilan-types. Infrastructure implementations
//! live in oilan-infra.

pub mod chat;
pub mod dialog;
pub mod generation;

#[cfg(test)]
pub(crate) mod testing;
