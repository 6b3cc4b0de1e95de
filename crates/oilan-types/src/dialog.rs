//! Dialog and message types for Oilan.
//!
//! A dialog is a conversation owned by exactly one user. Its messages are
//! append-only and totally ordered by creation time; that order is what the
//! generation backend and every client see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::ids::{DialogId, MessageId, UserId};

/// Title given to dialogs started without one.
pub const DEFAULT_DIALOG_TITLE: &str = "New Chat";

/// Author of a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant', 'ai'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            // Legacy rows wrote the assistant role as "ai".
            "assistant" | "ai" => Ok(Role::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message within a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub dialog_id: DialogId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A dialog with its full, ordered message history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub id: DialogId,
    pub owner_id: UserId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dialog {
    /// Whether `user_id` owns this dialog.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Listing view of this dialog (drops the message bodies).
    pub fn summary(&self) -> DialogSummary {
        DialogSummary {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Dialog metadata without messages, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSummary {
    pub id: DialogId,
    pub owner_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalize a requested title, falling back to [`DEFAULT_DIALOG_TITLE`].
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_DIALOG_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}
