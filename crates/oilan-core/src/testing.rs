//! In-memory fakes shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use oilan_types::dialog::{Dialog, DialogSummary, Message, Role};
use oilan_types::error::RepositoryError;
use oilan_types::generation::{GenerationError, GenerationRequest};
use oilan_types::ids::{DialogId, MessageId, UserId};

use crate::dialog::store::DialogStore;
use crate::generation::backend::GenerationBackend;

#[derive(Default)]
struct MemoryInner {
    dialogs: Vec<Dialog>,
    next_message_id: i64,
    writes: usize,
}

/// Mutex-backed `DialogStore` that counts successful writes.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    fail_appends: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl DialogStore for MemoryStore {
    async fn create_dialog(&self, owner_id: UserId, title: &str) -> Result<Dialog, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        let previous = inner
            .dialogs
            .iter()
            .map(|d| d.updated_at)
            .max()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let now = next_timestamp(previous);
        let dialog = Dialog {
            id: DialogId(inner.dialogs.len() as i64 + 1),
            owner_id,
            title: title.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.dialogs.push(dialog.clone());
        inner.writes += 1;
        Ok(dialog)
    }

    async fn append_message(
        &self,
        dialog_id: DialogId,
        role: Role,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk full".to_string()));
        }

        let mut inner = self.inner.lock().unwrap();
        inner.next_message_id += 1;
        let id = MessageId(inner.next_message_id);
        let dialog = inner
            .dialogs
            .iter_mut()
            .find(|d| d.id == dialog_id)
            .ok_or(RepositoryError::NotFound)?;

        let created_at = next_timestamp(dialog.updated_at);
        let message = Message {
            id,
            dialog_id,
            role,
            content: content.to_string(),
            created_at,
        };
        dialog.messages.push(message.clone());
        dialog.updated_at = created_at;
        inner.writes += 1;
        Ok(message)
    }

    async fn get_dialog(&self, dialog_id: DialogId) -> Result<Option<Dialog>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.dialogs.iter().find(|d| d.id == dialog_id).cloned())
    }

    async fn list_dialogs_for_user(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<DialogSummary>, RepositoryError> {
        let all = self.list_all_dialogs().await?;
        Ok(all.into_iter().filter(|d| d.owner_id == owner_id).collect())
    }

    async fn list_all_dialogs(&self) -> Result<Vec<DialogSummary>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        let mut summaries: Vec<DialogSummary> = inner.dialogs.iter().map(Dialog::summary).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }
}

/// Backend that replays scripted results and records every request.
///
/// Once the script is exhausted the fallback result is returned.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: Result<String, GenerationError>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn always(reply: &str) -> Self {
        Self::with_fallback(Vec::new(), Ok(reply.to_string()))
    }

    pub fn failing() -> Self {
        Self::with_fallback(
            Vec::new(),
            Err(GenerationError::Provider {
                message: "backend offline".to_string(),
            }),
        )
    }

    pub fn sequence(script: Vec<Result<String, GenerationError>>) -> Self {
        Self::with_fallback(script, Err(GenerationError::EmptyResponse))
    }

    fn with_fallback(
        script: Vec<Result<String, GenerationError>>,
        fallback: Result<String, GenerationError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
