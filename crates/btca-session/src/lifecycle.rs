use btca_persist::PersistenceClient;
use btca_types::{NewQuestion, QuestionStatus, ThreadState};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SessionError};

/// Bounded exponential backoff for persistence calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            attempts,
            initial_backoff,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> btca_persist::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = btca_persist::Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    tracing::warn!(operation, attempt, error = %e, "Persistence call failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Owns the thread of the session and keeps its question list in step with
/// the persistence collaborator.
///
/// Thread: `uninitialized -> active`, once. Question: `pending -> answered`
/// or `pending -> canceled`; only the last question is ever mutated.
/// Answer and cancel calls without an active question are silent no-ops:
/// they can legitimately race session startup.
pub struct ThreadLifecycle {
    persistence: Arc<dyn PersistenceClient>,
    retry: RetryPolicy,
    thread: Option<ThreadState>,
    last_question_id: Option<String>,
    unsynced: BTreeSet<String>,
}

impl ThreadLifecycle {
    pub fn new(persistence: Arc<dyn PersistenceClient>) -> Self {
        Self {
            persistence,
            retry: RetryPolicy::default(),
            thread: None,
            last_question_id: None,
            unsynced: BTreeSet::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_active(&self) -> bool {
        self.thread.is_some()
    }

    pub fn current_thread(&self) -> Option<&ThreadState> {
        self.thread.as_ref()
    }

    /// Persisted id of the last question, once `persist_question` resolved
    pub fn last_question_id(&self) -> Option<&str> {
        self.last_question_id.as_deref()
    }

    pub fn set_last_question_id(&mut self, id: Option<String>) {
        self.last_question_id = id;
    }

    /// In-memory ids of questions whose last write never reached the store
    pub fn unsynced_questions(&self) -> impl Iterator<Item = &str> {
        self.unsynced.iter().map(String::as_str)
    }

    /// Create the thread on first use; later calls do nothing
    pub async fn initialize_thread(&mut self) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        let persistence = self.persistence.as_ref();
        let thread_id = self
            .retry
            .run("create_thread", || persistence.create_thread())
            .await?;

        tracing::info!(thread_id = %thread_id, "Thread initialized");
        self.thread = Some(ThreadState::new(thread_id));
        Ok(())
    }

    pub fn add_resources_to_thread(&mut self, resources: &[String]) {
        if let Some(thread) = self.thread.as_mut() {
            thread.merge_resources(resources.iter().cloned());
        }
    }

    /// Append the question in memory, persist it, and remember the persisted
    /// id as the last question. Returns that id.
    pub async fn add_question_to_thread(&mut self, question: NewQuestion) -> Result<String> {
        let Some(thread) = self.thread.as_mut() else {
            return Err(SessionError::ThreadNotInitialized);
        };

        let local_id = uuid::Uuid::new_v4().to_string();
        thread.questions.push(question.clone().with_id(local_id.clone()));
        let thread_id = thread.id.clone();

        let persistence = self.persistence.as_ref();
        let persisted = self
            .retry
            .run("persist_question", || persistence.persist_question(&thread_id, question.clone()))
            .await;

        match persisted {
            Ok(question_id) => {
                tracing::debug!(question_id = %question_id, "Question persisted");
                self.last_question_id = Some(question_id.clone());
                Ok(question_id)
            }
            Err(e) => {
                tracing::error!(question_id = %local_id, error = %e, "Failed to persist question");
                // later mutators must not land on the previous question's record
                self.last_question_id = None;
                self.unsynced.insert(local_id);
                Err(e.into())
            }
        }
    }

    pub async fn update_last_question_answer(&mut self, answer: &str) -> Result<()> {
        let (Some(thread), Some(question_id)) = (self.thread.as_mut(), self.last_question_id.clone()) else {
            tracing::debug!("No active question, answer not recorded");
            return Ok(());
        };
        let Some(question) = thread.last_question_mut() else {
            return Ok(());
        };

        question.answer = answer.to_string();
        if question.status == QuestionStatus::Pending {
            question.status = QuestionStatus::Answered;
        }
        let local_id = question.id.clone();

        let persistence = self.persistence.as_ref();
        let result = self
            .retry
            .run("update_question_answer", || {
                persistence.update_question_answer(&question_id, answer)
            })
            .await;
        self.record_sync(local_id, result)
    }

    pub async fn mark_last_question_canceled(&mut self) -> Result<()> {
        let (Some(thread), Some(question_id)) = (self.thread.as_mut(), self.last_question_id.clone()) else {
            tracing::debug!("No active question, cancel not recorded");
            return Ok(());
        };
        let Some(question) = thread.last_question_mut() else {
            return Ok(());
        };

        question.status = QuestionStatus::Canceled;
        let local_id = question.id.clone();

        let persistence = self.persistence.as_ref();
        let result = self
            .retry
            .run("update_question_status", || {
                persistence.update_question_status(&question_id, QuestionStatus::Canceled)
            })
            .await;
        self.record_sync(local_id, result)
    }

    fn record_sync(&mut self, local_id: String, result: btca_persist::Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.unsynced.remove(&local_id);
                Ok(())
            }
            Err(e) => {
                tracing::error!(question_id = %local_id, error = %e, "Question diverged from persisted record");
                self.unsynced.insert(local_id);
                Err(e.into())
            }
        }
    }
}
