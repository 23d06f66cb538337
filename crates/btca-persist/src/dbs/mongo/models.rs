use btca_types::QuestionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{StoredQuestion, StoredThread};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub resources: Vec<String>,
    pub prompt: String,
    pub answer: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredThread> for MongoThread {
    fn from(thread: StoredThread) -> Self {
        Self {
            id: thread.id,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

impl From<StoredQuestion> for MongoQuestion {
    fn from(q: StoredQuestion) -> Self {
        Self {
            id: q.id,
            thread_id: q.thread_id,
            resources: q.resources,
            prompt: q.prompt,
            answer: q.answer,
            status: q.status,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

impl From<MongoQuestion> for StoredQuestion {
    fn from(q: MongoQuestion) -> Self {
        Self {
            id: q.id,
            thread_id: q.thread_id,
            resources: q.resources,
            prompt: q.prompt,
            answer: q.answer,
            status: q.status,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}
