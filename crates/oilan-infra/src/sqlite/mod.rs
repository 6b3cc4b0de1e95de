//! SQLite storage layer.
//!
//! `DialogStore` backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod dialog;
pub mod pool;
