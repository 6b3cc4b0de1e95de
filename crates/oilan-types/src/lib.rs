//! Shared domain types for Oilan.
//!
//! This crate contains the types used across the dialog engine:
//! Dialog, Message, Role, identifiers, generation requests, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod dialog;
pub mod error;
pub mod generation;
pub mod ids;
