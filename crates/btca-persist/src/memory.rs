use async_trait::async_trait;
use btca_types::{NewQuestion, QuestionStatus};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{StoredQuestion, StoredThread};
use crate::trait_client::PersistenceClient;

/// Process-local backend. Nothing survives the process.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    threads: RwLock<HashMap<String, StoredThread>>,
    questions: RwLock<Vec<StoredQuestion>>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn get_question(&self, question_id: &str) -> Option<StoredQuestion> {
        self.questions
            .read()
            .await
            .iter()
            .find(|q| q.id == question_id)
            .cloned()
    }

    async fn touch_thread(&self, thread_id: &str) {
        if let Some(thread) = self.threads.write().await.get_mut(thread_id) {
            thread.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_thread(&self) -> Result<String> {
        let thread = StoredThread::new();
        let id = thread.id.clone();
        self.threads.write().await.insert(id.clone(), thread);
        tracing::debug!(thread_id = %id, "Created thread");
        Ok(id)
    }

    async fn persist_question(&self, thread_id: &str, question: NewQuestion) -> Result<String> {
        if !self.threads.read().await.contains_key(thread_id) {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }

        let stored = StoredQuestion::new(thread_id, question);
        let id = stored.id.clone();
        self.questions.write().await.push(stored);
        self.touch_thread(thread_id).await;
        Ok(id)
    }

    async fn update_question_answer(&self, question_id: &str, answer: &str) -> Result<()> {
        let mut questions = self.questions.write().await;
        let question = questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| PersistError::QuestionNotFound(question_id.to_string()))?;

        question.answer = answer.to_string();
        question.status = StoredQuestion::status_after_answer(question.status);
        question.updated_at = Utc::now();
        Ok(())
    }

    async fn update_question_status(&self, question_id: &str, status: QuestionStatus) -> Result<()> {
        let mut questions = self.questions.write().await;
        let question = questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| PersistError::QuestionNotFound(question_id.to_string()))?;

        question.status = status;
        question.updated_at = Utc::now();
        Ok(())
    }

    async fn get_thread_questions(&self, thread_id: &str) -> Result<Vec<StoredQuestion>> {
        if !self.threads.read().await.contains_key(thread_id) {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }

        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| q.thread_id == thread_id)
            .cloned()
            .collect())
    }
}
