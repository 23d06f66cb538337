use btca_persist::PersistenceClient;
use btca_stream::EventStream;
use btca_types::{CancelState, Message, MessageContent, ModelConfig, NewQuestion, QuestionStatus, StreamEvent, ThreadState};
use futures::{FutureExt, StreamExt};
use std::sync::Arc;

use crate::accumulator::MessageAccumulator;
use crate::cancel::{CancelCoordinator, CancelHandle};
use crate::collaborators::{ModelConfigReader, QuestionRequest, QuestionStreamer, ResourceRegistry};
use crate::error::Result;
use crate::handlers::StreamHandlers;
use crate::lifecycle::{RetryPolicy, ThreadLifecycle};
use crate::resolver::{merge_resources, parse_query, resolve_resources};

pub const WELCOME_MESSAGE: &str =
    "Welcome to btca! Ask anything about the library/framework you're interested in (make sure you @ it first)";

/// One user prompt as typed, plus explicitly declared resources
#[derive(Debug, Clone, Default)]
pub struct AskInput {
    pub question: String,
    pub resources: Vec<String>,
    /// Single-resource alias, merged after mentions
    pub tech: Option<String>,
}

impl AskInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_tech(mut self, tech: impl Into<String>) -> Self {
        self.tech = Some(tech.into());
        self
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub question_id: String,
    pub resources: Vec<String>,
    pub status: QuestionStatus,
    pub answer: String,
    /// Stream errors shown during the turn
    pub errors: Vec<String>,
}

enum Step {
    Cancel,
    Event(Option<StreamEvent>),
}

/// Conversation session: transcript, thread lifecycle and cancel signal,
/// driven by a single consumer one event at a time.
pub struct Session {
    messages: Vec<Message>,
    lifecycle: ThreadLifecycle,
    cancel: CancelCoordinator,
    model: ModelConfig,
    registry: Arc<dyn ResourceRegistry>,
    streamer: Arc<dyn QuestionStreamer>,
}

impl Session {
    pub fn new(
        registry: Arc<dyn ResourceRegistry>,
        streamer: Arc<dyn QuestionStreamer>,
        persistence: Arc<dyn PersistenceClient>,
    ) -> Self {
        Self {
            messages: vec![Message::system(WELCOME_MESSAGE)],
            lifecycle: ThreadLifecycle::new(persistence),
            cancel: CancelCoordinator::new(),
            model: ModelConfig::default(),
            registry,
            streamer,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.lifecycle = self.lifecycle.with_retry_policy(retry);
        self
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Read the model once at session start, keeping `fallback` when the
    /// reader fails or reports nothing.
    pub async fn load_model(&mut self, reader: &dyn ModelConfigReader, fallback: ModelConfig) -> &ModelConfig {
        self.model = match reader.get_model().await {
            Ok(model) if !model.is_empty() => model,
            Ok(_) => fallback,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read model config, using fallback");
                fallback
            }
        };
        &self.model
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn lifecycle(&self) -> &ThreadLifecycle {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut ThreadLifecycle {
        &mut self.lifecycle
    }

    pub fn current_thread(&self) -> Option<&ThreadState> {
        self.lifecycle.current_thread()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.handle()
    }

    pub fn cancel_state(&self) -> CancelState {
        self.cancel.state()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Back to the welcome message only
    pub fn clear_messages(&mut self) {
        self.messages = vec![Message::system(WELCOME_MESSAGE)];
    }

    /// Collapse the last assistant message to its simple text form
    pub fn update_last_assistant_message(&mut self, content: impl Into<String>) {
        if let Some(message) = self.messages.iter_mut().rev().find(|m| m.is_assistant()) {
            message.content = MessageContent::text(content);
        }
    }

    pub fn mark_last_assistant_message_canceled(&mut self) {
        if let Some(message) = self.messages.iter_mut().rev().find(|m| m.is_assistant()) {
            message.canceled = true;
        }
    }

    /// Run one turn: resolve resources, stream the answer into the
    /// transcript, then record the answer or the cancellation.
    pub async fn ask(&mut self, input: AskInput, handlers: &mut dyn StreamHandlers) -> Result<TurnOutcome> {
        self.cancel.reset();

        let parsed = parse_query(&input.question);
        let merged = merge_resources(&input.resources, &parsed.resources, input.tech.as_deref());
        let resources = resolve_resources(merged, self.registry.as_ref()).await?;

        self.lifecycle.initialize_thread().await?;
        self.lifecycle.add_resources_to_thread(&resources);

        self.messages.push(Message::user(input.question.trim()));
        self.messages.push(Message::assistant_stream());

        let question_id = self
            .lifecycle
            .add_question_to_thread(NewQuestion::pending(parsed.query.clone(), resources.clone()))
            .await?;
        tracing::info!(question_id = %question_id, resources = ?resources, "Turn started");

        let request = QuestionRequest {
            question: parsed.query,
            resources: resources.clone(),
        };
        let mut errors = Vec::new();
        let mut accumulator = MessageAccumulator::new();

        if self.cancel.is_requested() {
            tracing::info!(question_id = %question_id, "Turn canceled before the answer stream opened");
        } else {
            match self.streamer.ask_question_stream(request).await {
                Ok(events) => self.consume(events, &mut accumulator, handlers, &mut errors).await,
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(error = %message, "Could not open answer stream");
                    handlers.on_error(&message);
                    errors.push(message);
                }
            }
        }
        accumulator.finalize();

        let answer = accumulator
            .message_index()
            .and_then(|index| self.messages.get(index))
            .map(Message::answer_text)
            .unwrap_or_default();

        // a request, acknowledged or not, always wins over completion
        let status = if self.cancel.is_requested() {
            self.cancel.acknowledge();
            match accumulator.message_index().and_then(|index| self.messages.get_mut(index)) {
                Some(message) => message.canceled = true,
                None => self.mark_last_assistant_message_canceled(),
            }
            self.lifecycle.mark_last_question_canceled().await?;
            QuestionStatus::Canceled
        } else {
            self.lifecycle.update_last_question_answer(&answer).await?;
            QuestionStatus::Answered
        };

        tracing::info!(question_id = %question_id, status = status.as_str(), "Turn finished");
        Ok(TurnOutcome {
            question_id,
            resources,
            status,
            answer,
            errors,
        })
    }

    async fn consume(
        &mut self,
        mut events: EventStream,
        accumulator: &mut MessageAccumulator,
        handlers: &mut dyn StreamHandlers,
        errors: &mut Vec<String>,
    ) {
        loop {
            let step = tokio::select! {
                biased;
                _ = self.cancel.requested() => Step::Cancel,
                event = events.next() => Step::Event(event),
            };

            let event = match step {
                Step::Cancel => {
                    self.cancel.acknowledge();
                    tracing::info!("Turn canceled, keeping buffered events and abandoning stream");
                    self.drain_ready(&mut events, accumulator, errors);
                    return;
                }
                Step::Event(None) => return,
                Step::Event(Some(event)) => event,
            };

            let tool_started = accumulator.apply(&mut self.messages, &event);
            match &event {
                StreamEvent::Meta { .. } => handlers.on_meta(),
                StreamEvent::ReasoningDelta { delta } => handlers.on_reasoning_delta(delta),
                StreamEvent::TextDelta { delta } => handlers.on_text_delta(delta),
                StreamEvent::ToolUpdated { tool, .. } => {
                    if tool_started {
                        handlers.on_tool_call(tool);
                    }
                }
                StreamEvent::Error { message } => {
                    handlers.on_error(message);
                    errors.push(message.clone());
                }
                StreamEvent::Done { .. } => return,
            }
        }
    }

    /// Apply events that are already decoded once a cancel is acknowledged.
    /// Content is kept; handlers are not called for it.
    fn drain_ready(&mut self, events: &mut EventStream, accumulator: &mut MessageAccumulator, errors: &mut Vec<String>) {
        while let Some(Some(event)) = events.next().now_or_never() {
            accumulator.apply(&mut self.messages, &event);
            match event {
                StreamEvent::Error { message } => errors.push(message),
                StreamEvent::Done { .. } => return,
                _ => {}
            }
        }
    }
}
