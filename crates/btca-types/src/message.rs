use serde::{Deserialize, Serialize};

use crate::events::ToolStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub canceled: bool,
}

impl Message {
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content,
            canceled: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::text(text))
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, MessageContent::text(text))
    }

    /// Empty assistant message in the incremental form, ready to receive chunks
    pub fn assistant_stream() -> Self {
        Self::new(Role::Assistant, MessageContent::Chunks { chunks: Vec::new() })
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Answer prose: the text form, or every text chunk joined in order.
    /// Reasoning and tool chunks are not part of the answer.
    pub fn answer_text(&self) -> String {
        match &self.content {
            MessageContent::Text { content } => content.clone(),
            MessageContent::Chunks { chunks } => chunks
                .iter()
                .filter_map(|chunk| match chunk {
                    Chunk::Text { text, .. } => Some(text.as_str()),
                    Chunk::Reasoning { .. } | Chunk::Tool { .. } => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { content: String },
    Chunks { chunks: Vec<Chunk> },
}

impl MessageContent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        match self {
            Self::Text { .. } => &[],
            Self::Chunks { chunks } => chunks,
        }
    }
}

/// Fragment of an assistant answer. Ids are unique within one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Chunk {
    Text {
        id: String,
        text: String,
    },
    Reasoning {
        id: String,
        text: String,
    },
    Tool {
        id: String,
        tool: String,
        state: ToolStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Text,
    Reasoning,
    Tool,
}

impl Chunk {
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } | Self::Reasoning { id, .. } | Self::Tool { id, .. } => id,
        }
    }

    pub fn kind(&self) -> ChunkKind {
        match self {
            Self::Text { .. } => ChunkKind::Text,
            Self::Reasoning { .. } => ChunkKind::Reasoning,
            Self::Tool { .. } => ChunkKind::Tool,
        }
    }
}
