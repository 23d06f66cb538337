pub mod accumulator;
pub mod cancel;
pub mod collaborators;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod resolver;
pub mod session;

pub use accumulator::MessageAccumulator;
pub use cancel::{CancelCoordinator, CancelHandle};
pub use collaborators::{ModelConfigReader, QuestionRequest, QuestionStreamer, ResourceRegistry};
pub use error::{Result, SessionError};
pub use handlers::StreamHandlers;
pub use lifecycle::{RetryPolicy, ThreadLifecycle};
pub use resolver::{merge_resources, parse_query, resolve_resources, ParsedQuery};
pub use session::{AskInput, Session, TurnOutcome, WELCOME_MESSAGE};
