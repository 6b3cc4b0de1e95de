//! Infrastructure layer for Oilan.
//!
//! Implements the ports defined in `oilan-core`: the SQLite `DialogStore`,
//! HTTP generation backends (OpenAI, Gemini) plus a mock, and config loading.

pub mod config;
pub mod llm;
pub mod sqlite;
