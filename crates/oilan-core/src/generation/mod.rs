//! Generation backend abstraction.

pub mod backend;
