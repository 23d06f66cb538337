use btca_types::{NewQuestion, QuestionStatus, ThreadQuestion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database-agnostic thread record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredThread {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredThread {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for StoredThread {
    fn default() -> Self {
        Self::new()
    }
}

/// Database-agnostic question record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub id: String,
    pub thread_id: String,
    pub resources: Vec<String>,
    pub prompt: String,
    pub answer: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredQuestion {
    pub fn new(thread_id: impl Into<String>, question: NewQuestion) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            resources: question.resources,
            prompt: question.prompt,
            answer: question.answer,
            status: question.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Status after an answer lands: only pending moves forward
    pub fn status_after_answer(status: QuestionStatus) -> QuestionStatus {
        match status {
            QuestionStatus::Pending => QuestionStatus::Answered,
            other => other,
        }
    }
}

impl From<StoredQuestion> for ThreadQuestion {
    fn from(stored: StoredQuestion) -> Self {
        Self {
            id: stored.id,
            resources: stored.resources,
            prompt: stored.prompt,
            answer: stored.answer,
            status: stored.status,
        }
    }
}
