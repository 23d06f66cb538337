use async_trait::async_trait;
use btca_stream::EventStream;
use btca_types::{ModelConfig, Resource};
use serde::{Deserialize, Serialize};

/// Source of the resources a question may be answered from
#[async_trait]
pub trait ResourceRegistry: Send + Sync {
    async fn list_resources(&self) -> anyhow::Result<Vec<Resource>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    pub resources: Vec<String>,
}

/// Issues the streaming request for one turn
#[async_trait]
pub trait QuestionStreamer: Send + Sync {
    async fn ask_question_stream(&self, request: QuestionRequest) -> anyhow::Result<EventStream>;
}

#[async_trait]
pub trait ModelConfigReader: Send + Sync {
    async fn get_model(&self) -> anyhow::Result<ModelConfig>;
}
