use serde::{Deserialize, Serialize};

/// Typed events decoded from a streaming answer.
///
/// Tags follow the wire taxonomy (`text.delta`, `tool.updated`, ...). Unknown
/// fields on any variant are ignored so newer servers stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Stream accepted and a working context exists server-side
    #[serde(rename = "meta")]
    Meta {},

    /// Next fragment of the active reasoning chunk
    #[serde(rename = "reasoning.delta")]
    ReasoningDelta { delta: String },

    /// Next fragment of the active text chunk
    #[serde(rename = "text.delta")]
    TextDelta { delta: String },

    /// A tool invocation changed status
    #[serde(rename = "tool.updated")]
    ToolUpdated { tool: String, state: ToolState },

    /// Transport-level failure; the stream may continue or end
    #[serde(rename = "error")]
    Error { message: String },

    /// Stream completed normally
    #[serde(rename = "done")]
    Done {},
}

impl StreamEvent {
    pub fn meta() -> Self {
        Self::Meta {}
    }

    pub fn done() -> Self {
        Self::Done {}
    }

    pub fn reasoning(delta: impl Into<String>) -> Self {
        Self::ReasoningDelta { delta: delta.into() }
    }

    pub fn text(delta: impl Into<String>) -> Self {
        Self::TextDelta { delta: delta.into() }
    }

    pub fn tool(tool: impl Into<String>, status: ToolStatus) -> Self {
        Self::ToolUpdated {
            tool: tool.into(),
            state: ToolState::new(status),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// `done` always ends the sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolState {
    pub status: ToolStatus,

    /// Identity of the invocation when the server reports one
    #[serde(
        default,
        alias = "callID",
        alias = "callId",
        skip_serializing_if = "Option::is_none"
    )]
    pub call_id: Option<String>,
}

impl ToolState {
    pub fn new(status: ToolStatus) -> Self {
        Self { status, call_id: None }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}
