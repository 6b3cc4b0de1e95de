//! SQLite dialog store implementation.
//!
//! Implements `DialogStore` from `oilan-core` using sqlx with split read/write
//! pools: raw queries, private Row structs, reads on the reader pool and
//! transactional appends on the single-connection writer.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use oilan_core::dialog::store::DialogStore;
use oilan_types::dialog::{Dialog, DialogSummary, Message, Role};
use oilan_types::error::RepositoryError;
use oilan_types::ids::{DialogId, MessageId, UserId};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `DialogStore`.
#[derive(Clone)]
pub struct SqliteDialogStore {
    pool: DatabasePool,
}

impl SqliteDialogStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct DialogRow {
    id: i64,
    owner_id: i64,
    title: String,
    created_at: String,
    updated_at: String,
}

impl DialogRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_summary(self) -> Result<DialogSummary, RepositoryError> {
        Ok(DialogSummary {
            id: DialogId(self.id),
            owner_id: UserId(self.owner_id),
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: i64,
    dialog_id: i64,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            dialog_id: row.try_get("dialog_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id: MessageId(self.id),
            dialog_id: DialogId(self.dialog_id),
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width so that string comparison in SQL matches time order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision we store.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// The next `updated_at` for a dialog: now, or one microsecond past the
/// previous value if the clock has not moved (or moved backwards).
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_micros();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn summaries_from_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<DialogSummary>, RepositoryError> {
    rows.iter()
        .map(|row| {
            DialogRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_summary()
        })
        .collect()
}

impl DialogStore for SqliteDialogStore {
    async fn create_dialog(&self, owner_id: UserId, title: &str) -> Result<Dialog, RepositoryError> {
        let now = now_micros();
        let now_str = format_datetime(&now);

        let result = sqlx::query(
            "INSERT INTO dialogs (owner_id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(owner_id.get())
        .bind(title)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let id = DialogId(result.last_insert_rowid());
        tracing::debug!(dialog_id = %id, owner_id = %owner_id, "Inserted dialog");

        Ok(Dialog {
            id,
            owner_id,
            title: title.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn append_message(
        &self,
        dialog_id: DialogId,
        role: Role,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT updated_at FROM dialogs WHERE id = ?")
            .bind(dialog_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Dropping the transaction rolls it back
        let Some(row) = row else {
            return Err(RepositoryError::NotFound);
        };
        let previous: String = row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let created_at = next_timestamp(parse_datetime(&previous)?);
        let created_str = format_datetime(&created_at);

        let result = sqlx::query(
            "INSERT INTO messages (dialog_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(dialog_id.get())
        .bind(role.to_string())
        .bind(content)
        .bind(&created_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let message_id = MessageId(result.last_insert_rowid());

        sqlx::query("UPDATE dialogs SET updated_at = ? WHERE id = ?")
            .bind(&created_str)
            .bind(dialog_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Message {
            id: message_id,
            dialog_id,
            role,
            content: content.to_string(),
            created_at,
        })
    }

    async fn get_dialog(&self, dialog_id: DialogId) -> Result<Option<Dialog>, RepositoryError> {
        // One read transaction so the header and history come from the same snapshot
        let mut tx = self
            .pool
            .reader
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query(
            "SELECT id, owner_id, title, created_at, updated_at FROM dialogs WHERE id = ?",
        )
        .bind(dialog_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let summary = DialogRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_summary()?;

        let rows = sqlx::query(
            "SELECT id, dialog_id, role, content, created_at FROM messages
             WHERE dialog_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(dialog_id.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let messages = rows
            .iter()
            .map(|row| {
                MessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Dialog {
            id: summary.id,
            owner_id: summary.owner_id,
            title: summary.title,
            messages,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }))
    }

    async fn list_dialogs_for_user(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<DialogSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, title, created_at, updated_at FROM dialogs
             WHERE owner_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(owner_id.get())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        summaries_from_rows(&rows)
    }

    async fn list_all_dialogs(&self) -> Result<Vec<DialogSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, title, created_at, updated_at FROM dialogs
             ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        summaries_from_rows(&rows)
    }
}
