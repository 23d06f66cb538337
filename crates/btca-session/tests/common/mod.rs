#![allow(dead_code)]

use async_trait::async_trait;
use btca_persist::{InMemoryPersistenceClient, PersistError, PersistenceClient, StoredQuestion};
use btca_session::{CancelHandle, QuestionRequest, QuestionStreamer, ResourceRegistry, StreamHandlers};
use btca_stream::EventStream;
use btca_types::{NewQuestion, QuestionStatus, Resource, StreamEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct StaticRegistry(pub Vec<&'static str>);

#[async_trait]
impl ResourceRegistry for StaticRegistry {
    async fn list_resources(&self) -> anyhow::Result<Vec<Resource>> {
        Ok(self.0.iter().map(|name| Resource::new(*name)).collect())
    }
}

/// Replays a fixed event list and remembers what was asked
#[derive(Default)]
pub struct ScriptedStreamer {
    pub events: Vec<StreamEvent>,
    pub fail_with: Option<String>,
    pub requests: Mutex<Vec<QuestionRequest>>,
}

impl ScriptedStreamer {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<QuestionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionStreamer for ScriptedStreamer {
    async fn ask_question_stream(&self, request: QuestionRequest) -> anyhow::Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }
        Ok(Box::pin(futures::stream::iter(self.events.clone())))
    }
}

/// In-memory store that counts calls and can fail the first N writes
#[derive(Default)]
pub struct CountingPersistence {
    pub inner: InMemoryPersistenceClient,
    pub create_thread_calls: AtomicUsize,
    pub answer_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub failing_writes: AtomicUsize,
    /// Requested while the question is being persisted
    pub cancel_on_persist: Mutex<Option<CancelHandle>>,
}

impl CountingPersistence {
    pub fn failing(writes: usize) -> Self {
        let store = Self::default();
        store.failing_writes.store(writes, Ordering::SeqCst);
        store
    }

    fn maybe_fail(&self) -> btca_persist::Result<()> {
        let remaining = self.failing_writes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_writes.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistError::Connection("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceClient for CountingPersistence {
    async fn create_thread(&self) -> btca_persist::Result<String> {
        self.create_thread_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_thread().await
    }

    async fn persist_question(&self, thread_id: &str, question: NewQuestion) -> btca_persist::Result<String> {
        self.maybe_fail()?;
        if let Some(handle) = self.cancel_on_persist.lock().unwrap().as_ref() {
            handle.request();
        }
        self.inner.persist_question(thread_id, question).await
    }

    async fn update_question_answer(&self, question_id: &str, answer: &str) -> btca_persist::Result<()> {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.inner.update_question_answer(question_id, answer).await
    }

    async fn update_question_status(&self, question_id: &str, status: QuestionStatus) -> btca_persist::Result<()> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.inner.update_question_status(question_id, status).await
    }

    async fn get_thread_questions(&self, thread_id: &str) -> btca_persist::Result<Vec<StoredQuestion>> {
        self.inner.get_thread_questions(thread_id).await
    }
}

/// Records every callback; optionally requests cancel after N text deltas
#[derive(Default)]
pub struct RecordingHandlers {
    pub calls: Vec<String>,
    pub cancel_after_text: Option<(usize, CancelHandle)>,
    pub cancel_on_error: Option<CancelHandle>,
    text_seen: usize,
}

impl RecordingHandlers {
    pub fn canceling_after(texts: usize, handle: CancelHandle) -> Self {
        Self {
            cancel_after_text: Some((texts, handle)),
            ..Default::default()
        }
    }

    pub fn canceling_on_error(handle: CancelHandle) -> Self {
        Self {
            cancel_on_error: Some(handle),
            ..Default::default()
        }
    }
}

impl StreamHandlers for RecordingHandlers {
    fn on_meta(&mut self) {
        self.calls.push("meta".to_string());
    }

    fn on_reasoning_delta(&mut self, delta: &str) {
        self.calls.push(format!("reasoning:{}", delta));
    }

    fn on_text_delta(&mut self, delta: &str) {
        self.calls.push(format!("text:{}", delta));
        self.text_seen += 1;
        if let Some((after, handle)) = &self.cancel_after_text {
            if self.text_seen == *after {
                handle.request();
            }
        }
    }

    fn on_tool_call(&mut self, tool: &str) {
        self.calls.push(format!("tool:{}", tool));
    }

    fn on_error(&mut self, message: &str) {
        self.calls.push(format!("error:{}", message));
        if let Some(handle) = &self.cancel_on_error {
            handle.request();
        }
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
