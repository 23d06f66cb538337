use async_trait::async_trait;
use btca_types::{NewQuestion, QuestionStatus};

use crate::error::Result;
use crate::models::StoredQuestion;

/// Durable record of threads and their questions
///
/// Implementations own id generation; callers only ever see the returned ids.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create an empty thread and return its id
    async fn create_thread(&self) -> Result<String>;

    /// Store a question under a thread and return the question's id
    async fn persist_question(&self, thread_id: &str, question: NewQuestion) -> Result<String>;

    /// Record the answer. A pending question becomes answered; a canceled
    /// one keeps its status.
    async fn update_question_answer(&self, question_id: &str, answer: &str) -> Result<()>;

    async fn update_question_status(&self, question_id: &str, status: QuestionStatus) -> Result<()>;

    /// Questions of a thread in insertion order
    async fn get_thread_questions(&self, thread_id: &str) -> Result<Vec<StoredQuestion>>;
}
