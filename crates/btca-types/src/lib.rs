pub mod config;
pub mod events;
pub mod message;
pub mod thread;

pub use config::ModelConfig;
pub use events::{StreamEvent, ToolState, ToolStatus};
pub use message::{Chunk, ChunkKind, Message, MessageContent, Role};
pub use thread::{CancelState, NewQuestion, QuestionStatus, Resource, ThreadQuestion, ThreadState};
