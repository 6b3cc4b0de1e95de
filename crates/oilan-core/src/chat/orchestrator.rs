//! Chat orchestrator driving dialog lifecycle and turn submission.
//!
//! `ChatOrchestrator` coordinates the `DialogStore` and the
//! `GenerationBackend`: it starts dialogs, guards ownership, persists the
//! user's turn before generation, and persists the assistant reply after.

use oilan_types::dialog::{Dialog, DialogSummary, Message, Role, normalize_title};
use oilan_types::error::ChatError;
use oilan_types::generation::{GenerationError, GenerationRequest};
use oilan_types::ids::{DialogId, UserId};
use tracing::{debug, info, warn};

use crate::dialog::store::DialogStore;
use crate::generation::backend::GenerationBackend;

/// How a turn treats generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPolicy {
    /// Total backend invocations per turn. Values below 1 are treated as 1.
    pub max_attempts: u32,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

/// Orchestrates dialogs and turns.
///
/// Generic over `DialogStore` and `GenerationBackend` to maintain clean
/// architecture (oilan-core never depends on oilan-infra). Built once at
/// startup and shared by every connection.
pub struct ChatOrchestrator<S: DialogStore, G: GenerationBackend> {
    store: S,
    backend: G,
    directive: String,
    policy: TurnPolicy,
}

impl<S: DialogStore, G: GenerationBackend> ChatOrchestrator<S, G> {
    /// Create an orchestrator with the default (no retry) turn policy.
    pub fn new(store: S, backend: G, directive: impl Into<String>) -> Self {
        Self {
            store,
            backend,
            directive: directive.into(),
            policy: TurnPolicy::default(),
        }
    }

    /// Replace the turn policy.
    pub fn with_policy(mut self, policy: TurnPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Access the dialog store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access the generation backend.
    pub fn backend(&self) -> &G {
        &self.backend
    }

    /// The directive sent with every generation request.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    // --- Dialog lifecycle ---

    /// Start a new, empty dialog owned by `user_id`.
    ///
    /// A blank title becomes "New Chat".
    pub async fn start_dialog(&self, user_id: UserId, title: &str) -> Result<Dialog, ChatError> {
        let title = normalize_title(title);
        let dialog = self.store.create_dialog(user_id, &title).await?;
        info!(dialog_id = %dialog.id, user_id = %user_id, "Dialog started");
        Ok(dialog)
    }

    /// Load a dialog on behalf of `user_id`, enforcing ownership.
    pub async fn dialog_for(
        &self,
        dialog_id: DialogId,
        user_id: UserId,
    ) -> Result<Dialog, ChatError> {
        self.load_owned(dialog_id, user_id).await
    }

    /// List the user's dialogs, most recently active first.
    pub async fn list_dialogs(&self, user_id: UserId) -> Result<Vec<DialogSummary>, ChatError> {
        Ok(self.store.list_dialogs_for_user(user_id).await?)
    }

    /// Load any dialog regardless of owner (operator view).
    pub async fn inspect_dialog(&self, dialog_id: DialogId) -> Result<Dialog, ChatError> {
        self.store
            .get_dialog(dialog_id)
            .await?
            .ok_or(ChatError::NotFound(dialog_id))
    }

    /// List every dialog in the store (operator view).
    pub async fn list_all_dialogs(&self) -> Result<Vec<DialogSummary>, ChatError> {
        Ok(self.store.list_all_dialogs().await?)
    }

    // --- Turns ---

    /// Submit a user turn and return the persisted assistant reply.
    ///
    /// The user's message is committed before the backend is called, so a
    /// generation failure returns `ChatError::Generation` with the user turn
    /// still in the history and no assistant message written.
    pub async fn post_turn(
        &self,
        dialog_id: DialogId,
        user_id: UserId,
        content: &str,
    ) -> Result<Message, ChatError> {
        self.load_owned(dialog_id, user_id).await?;

        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content cannot be empty".to_string(),
            ));
        }

        let user_message = self
            .store
            .append_message(dialog_id, Role::User, content)
            .await?;
        debug!(dialog_id = %dialog_id, message_id = %user_message.id, "User turn persisted");

        // Re-read so concurrent turns committed before ours are part of the history.
        let history = self
            .store
            .get_dialog(dialog_id)
            .await?
            .ok_or(ChatError::NotFound(dialog_id))?
            .messages;
        let request = GenerationRequest::from_messages(&history, self.directive.as_str());

        let reply = match self.generate(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    dialog_id = %dialog_id,
                    backend = self.backend.name(),
                    error = %err,
                    "Generation failed; user turn kept"
                );
                return Err(ChatError::Generation(err));
            }
        };

        let assistant_message = self
            .store
            .append_message(dialog_id, Role::Assistant, &reply)
            .await?;
        info!(
            dialog_id = %dialog_id,
            message_id = %assistant_message.id,
            history_len = history.len(),
            "Turn completed"
        );

        Ok(assistant_message)
    }

    /// Load-then-compare ownership guard.
    async fn load_owned(&self, dialog_id: DialogId, user_id: UserId) -> Result<Dialog, ChatError> {
        let dialog = self.inspect_dialog(dialog_id).await?;

        if !dialog.is_owned_by(user_id) {
            warn!(dialog_id = %dialog_id, user_id = %user_id, "Dialog access denied");
            return Err(ChatError::Forbidden(dialog_id));
        }

        Ok(dialog)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = self
                .backend
                .generate(request)
                .await
                .and_then(|reply| {
                    if reply.trim().is_empty() {
                        Err(GenerationError::EmptyResponse)
                    } else {
                        Ok(reply)
                    }
                });

            match result {
                Err(err) if attempt < attempts => {
                    warn!(attempt, attempts, error = %err, "Generation attempt failed, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, ScriptedBackend};

    fn orchestrator(backend: ScriptedBackend) -> ChatOrchestrator<MemoryStore, ScriptedBackend> {
        ChatOrchestrator::new(MemoryStore::new(), backend, "Be a patient listener.")
    }

    #[tokio::test]
    async fn test_start_dialog_defaults_title() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));

        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();
        assert_eq!(dialog.title, "New Chat");
        assert_eq!(dialog.owner_id, UserId(7));
        assert!(dialog.messages.is_empty());
        assert_eq!(dialog.created_at, dialog.updated_at);
    }

    #[tokio::test]
    async fn test_post_turn_persists_user_then_assistant() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();

        let reply = chat.post_turn(dialog.id, UserId(7), "hello").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "hi there");

        let stored = chat.store().get_dialog(dialog.id).await.unwrap().unwrap();
        let pairs: Vec<(Role, &str)> = stored
            .messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(pairs, vec![(Role::User, "hello"), (Role::Assistant, "hi there")]);

        // updated_at advanced once per appended message
        assert!(stored.messages[0].created_at > dialog.updated_at);
        assert_eq!(stored.updated_at, stored.messages[1].created_at);
        assert!(stored.messages[1].created_at > stored.messages[0].created_at);
        assert_eq!(chat.store().write_count(), 3);
    }

    #[tokio::test]
    async fn test_post_turn_sends_full_history_and_directive() {
        let backend = ScriptedBackend::sequence(vec![Ok("first".into()), Ok("second".into())]);
        let chat = orchestrator(backend);
        let dialog = chat.start_dialog(UserId(7), "history").await.unwrap();

        chat.post_turn(dialog.id, UserId(7), "one").await.unwrap();
        chat.post_turn(dialog.id, UserId(7), "two").await.unwrap();

        let requests = chat.backend().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].directive, "Be a patient listener.");
        let contents: Vec<&str> = requests[1].history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "first", "two"]);
        assert_eq!(requests[0].history.len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_only_user_message() {
        let chat = orchestrator(ScriptedBackend::failing());
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();
        let writes_before = chat.store().write_count();

        let err = chat.post_turn(dialog.id, UserId(7), "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));

        let stored = chat.store().get_dialog(dialog.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 1);
        assert_eq!(stored.messages[0].role, Role::User);
        assert_eq!(stored.messages[0].content, "hello");
        assert_eq!(chat.store().write_count(), writes_before + 1);
    }

    #[tokio::test]
    async fn test_blank_reply_is_a_generation_error() {
        let chat = orchestrator(ScriptedBackend::always("   "));
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();

        let err = chat.post_turn(dialog.id, UserId(7), "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(GenerationError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected_without_writes() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();
        let writes_before = chat.store().write_count();

        let err = chat.post_turn(dialog.id, UserId(7), "").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        let err = chat.post_turn(dialog.id, UserId(7), "  \n ").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));

        assert_eq!(chat.store().write_count(), writes_before);
        assert!(chat.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_regardless_of_content() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));
        let dialog = chat.start_dialog(UserId(1), "mine").await.unwrap();

        for content in ["hello", ""] {
            let err = chat.post_turn(dialog.id, UserId(2), content).await.unwrap_err();
            assert!(matches!(err, ChatError::Forbidden(id) if id == dialog.id));
        }

        let stored = chat.store().get_dialog(dialog.id).await.unwrap().unwrap();
        assert!(stored.messages.is_empty());
    }

    #[tokio::test]
    async fn test_missing_dialog_is_not_found() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));

        let err = chat.post_turn(DialogId(404), UserId(7), "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(DialogId(404))));

        let err = chat.dialog_for(DialogId(404), UserId(7)).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dialog_for_enforces_ownership() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));
        let dialog = chat.start_dialog(UserId(1), "").await.unwrap();

        assert_eq!(chat.dialog_for(dialog.id, UserId(1)).await.unwrap().id, dialog.id);
        let err = chat.dialog_for(dialog.id, UserId(2)).await.unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_inspect_dialog_ignores_owner() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));
        let dialog = chat.start_dialog(UserId(1), "").await.unwrap();
        chat.post_turn(dialog.id, UserId(1), "hello").await.unwrap();

        let seen = chat.inspect_dialog(dialog.id).await.unwrap();
        assert_eq!(seen.owner_id, UserId(1));
        assert_eq!(seen.messages.len(), 2);

        let err = chat.inspect_dialog(DialogId(999)).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(DialogId(999))));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_before_generation() {
        let chat = orchestrator(ScriptedBackend::always("hi there"));
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();
        chat.store().fail_appends(true);

        let err = chat.post_turn(dialog.id, UserId(7), "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(chat.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn test_retry_policy_reinvokes_backend() {
        let backend = ScriptedBackend::sequence(vec![
            Err(GenerationError::Transport("reset".into())),
            Ok("recovered".into()),
        ]);
        let chat = orchestrator(backend).with_policy(TurnPolicy { max_attempts: 2 });
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();

        let reply = chat.post_turn(dialog.id, UserId(7), "hello").await.unwrap();
        assert_eq!(reply.content, "recovered");
        assert_eq!(chat.backend().requests().len(), 2);

        let stored = chat.store().get_dialog(dialog.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_default_policy_does_not_retry() {
        let backend = ScriptedBackend::sequence(vec![
            Err(GenerationError::Transport("reset".into())),
            Ok("unused".into()),
        ]);
        let chat = orchestrator(backend);
        let dialog = chat.start_dialog(UserId(7), "").await.unwrap();

        assert!(chat.post_turn(dialog.id, UserId(7), "hello").await.is_err());
        assert_eq!(chat.backend().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_list_dialogs_most_recent_first() {
        let chat = orchestrator(ScriptedBackend::always("ok"));
        let older = chat.start_dialog(UserId(7), "older").await.unwrap();
        let newer = chat.start_dialog(UserId(7), "newer").await.unwrap();
        chat.start_dialog(UserId(8), "someone else").await.unwrap();

        let listed = chat.list_dialogs(UserId(7)).await.unwrap();
        let ids: Vec<DialogId> = listed.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        chat.post_turn(older.id, UserId(7), "bump").await.unwrap();
        let listed = chat.list_dialogs(UserId(7)).await.unwrap();
        assert_eq!(listed[0].id, older.id);

        assert_eq!(chat.list_all_dialogs().await.unwrap().len(), 3);
    }
}
