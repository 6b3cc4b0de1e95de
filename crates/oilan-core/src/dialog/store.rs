//! DialogStore trait definition.
//!
//! Durable storage for dialogs and their append-only message history.
//! Follows the RPITIT pattern used by every port in this crate.

use oilan_types::dialog::{Dialog, DialogSummary, Message, Role};
use oilan_types::error::RepositoryError;
use oilan_types::ids::{DialogId, UserId};

/// Repository trait for dialog and message persistence.
///
/// Implementations live in oilan-infra (e.g., `SqliteDialogStore`) and must
/// be safe to share between many concurrent connections.
pub trait DialogStore: Send + Sync {
    /// Create an empty dialog owned by `owner_id`.
    ///
    /// The store assigns the id and sets `created_at == updated_at`.
    fn create_dialog(
        &self,
        owner_id: UserId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Dialog, RepositoryError>> + Send;

    /// Append a message and advance the dialog's `updated_at`.
    ///
    /// Both writes happen in one transaction: either the message exists and
    /// `updated_at` equals its `created_at`, or neither change is visible.
    /// Returns `RepositoryError::NotFound` if the dialog does not exist.
    fn append_message(
        &self,
        dialog_id: DialogId,
        role: Role,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Get a dialog with its messages, ordered by creation time ascending.
    fn get_dialog(
        &self,
        dialog_id: DialogId,
    ) -> impl std::future::Future<Output = Result<Option<Dialog>, RepositoryError>> + Send;

    /// List a user's dialogs without message bodies, most recently active first.
    fn list_dialogs_for_user(
        &self,
        owner_id: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<DialogSummary>, RepositoryError>> + Send;

    /// List every dialog across users, most recently active first.
    fn list_all_dialogs(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<DialogSummary>, RepositoryError>> + Send;
}
