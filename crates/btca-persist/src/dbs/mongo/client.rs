use async_trait::async_trait;
use btca_types::{NewQuestion, QuestionStatus};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use super::models::{MongoQuestion, MongoThread};
use crate::error::{PersistError, Result};
use crate::models::{StoredQuestion, StoredThread};
use crate::trait_client::PersistenceClient;

pub struct MongoPersistenceClient {
    threads: Collection<MongoThread>,
    questions: Collection<MongoQuestion>,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and bind the `threads` and `questions` collections
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let db = client.database(database);
        Ok(Self {
            threads: db.collection("threads"),
            questions: db.collection("questions"),
        })
    }

    async fn touch_thread(&self, thread_id: &str) -> Result<()> {
        let update = doc! { "$set": { "updated_at": bson::to_bson(&Utc::now())? } };
        self.threads.update_one(doc! { "_id": thread_id }, update).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_thread(&self) -> Result<String> {
        let thread: MongoThread = StoredThread::new().into();
        self.threads.insert_one(&thread).await?;
        Ok(thread.id)
    }

    async fn persist_question(&self, thread_id: &str, question: NewQuestion) -> Result<String> {
        if self.threads.find_one(doc! { "_id": thread_id }).await?.is_none() {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }

        let question: MongoQuestion = StoredQuestion::new(thread_id, question).into();
        self.questions.insert_one(&question).await?;
        self.touch_thread(thread_id).await?;
        Ok(question.id)
    }

    async fn update_question_answer(&self, question_id: &str, answer: &str) -> Result<()> {
        let existing = self
            .questions
            .find_one(doc! { "_id": question_id })
            .await?
            .ok_or_else(|| PersistError::QuestionNotFound(question_id.to_string()))?;

        let status = StoredQuestion::status_after_answer(existing.status);
        let update = doc! {
            "$set": {
                "answer": answer,
                "status": bson::to_bson(&status)?,
                "updated_at": bson::to_bson(&Utc::now())?,
            }
        };
        self.questions.update_one(doc! { "_id": question_id }, update).await?;
        Ok(())
    }

    async fn update_question_status(&self, question_id: &str, status: QuestionStatus) -> Result<()> {
        let update = doc! {
            "$set": {
                "status": bson::to_bson(&status)?,
                "updated_at": bson::to_bson(&Utc::now())?,
            }
        };
        let result = self.questions.update_one(doc! { "_id": question_id }, update).await?;
        if result.matched_count == 0 {
            return Err(PersistError::QuestionNotFound(question_id.to_string()));
        }
        Ok(())
    }

    async fn get_thread_questions(&self, thread_id: &str) -> Result<Vec<StoredQuestion>> {
        let questions: Vec<MongoQuestion> = self
            .questions
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(questions.into_iter().map(Into::into).collect())
    }
}
