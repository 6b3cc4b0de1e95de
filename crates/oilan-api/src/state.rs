//! Application state wiring the orchestrator to its infrastructure.
//!
//! `ChatOrchestrator` is generic over the store and backend traits; AppState
//! pins it to the SQLite store and the backend enum chosen at startup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderName;

use oilan_core::chat::{ChannelSettings, ChatOrchestrator, TurnPolicy};
use oilan_infra::config::{resolve_database_url, resolve_directive};
use oilan_infra::llm::{Backend, api_key_from_env, create_backend};
use oilan_infra::sqlite::dialog::SqliteDialogStore;
use oilan_infra::sqlite::pool::DatabasePool;
use oilan_types::config::OilanConfig;

/// Concrete orchestrator type used by both CLI and HTTP handlers.
pub type ConcreteOrchestrator = ChatOrchestrator<SqliteDialogStore, Backend>;

/// Shared application state.
///
/// Cloned into every request; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub channel: Arc<ChannelSettings>,
    /// Header carrying the verified user id.
    pub identity_header: HeaderName,
    pub config: Arc<OilanConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: open the DB, build the backend,
    /// read the directive, and wire the orchestrator.
    pub async fn init(config: OilanConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("failed to open database {db_url}"))?;

        let api_key = api_key_from_env(&config.backend);
        let backend = create_backend(&config.backend, api_key.as_deref())?;
        let directive = resolve_directive(&config.chat, &data_dir).await?;

        let identity_header = HeaderName::try_from(config.server.identity_header.as_str())
            .with_context(|| {
                format!("invalid identity header name '{}'", config.server.identity_header)
            })?;

        tracing::info!(
            backend = %config.backend.kind,
            max_attempts = config.chat.max_generation_attempts,
            "Application state initialized"
        );

        let orchestrator = ChatOrchestrator::new(
            SqliteDialogStore::new(db_pool.clone()),
            backend,
            directive,
        )
        .with_policy(TurnPolicy {
            max_attempts: config.chat.max_generation_attempts,
        });

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            channel: Arc::new(ChannelSettings::from(&config.chat)),
            identity_header,
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
