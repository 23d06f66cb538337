use btca_types::{Chunk, ChunkKind, Message, MessageContent, StreamEvent, ToolState, ToolStatus};

/// Chunk currently being extended by deltas of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenChunk {
    index: usize,
    kind: ChunkKind,
}

/// Applies decoded stream events to the active assistant message.
///
/// Holds a cursor to that message and to the chunk being extended, so an
/// event never rescans the transcript. A delta extends the tail chunk when
/// it is of the same kind; anything else opens a new chunk, which keeps
/// reasoning, text and tool segments interleaved in arrival order.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    message: Option<usize>,
    open: Option<OpenChunk>,
    finalized: bool,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript index of the message this turn writes into
    pub fn message_index(&self) -> Option<usize> {
        self.message
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Apply one event. Returns true when it moved a tool into `running`.
    pub fn apply(&mut self, transcript: &mut Vec<Message>, event: &StreamEvent) -> bool {
        match event {
            StreamEvent::ReasoningDelta { delta } => {
                self.on_reasoning_delta(transcript, delta);
                false
            }
            StreamEvent::TextDelta { delta } => {
                self.on_text_delta(transcript, delta);
                false
            }
            StreamEvent::ToolUpdated { tool, state } => self.on_tool_updated(transcript, tool, state),
            StreamEvent::Done { .. } => {
                self.finalize();
                false
            }
            StreamEvent::Meta { .. } | StreamEvent::Error { .. } => false,
        }
    }

    pub fn on_reasoning_delta(&mut self, transcript: &mut Vec<Message>, delta: &str) {
        self.extend(transcript, ChunkKind::Reasoning, delta);
    }

    pub fn on_text_delta(&mut self, transcript: &mut Vec<Message>, delta: &str) {
        self.extend(transcript, ChunkKind::Text, delta);
    }

    /// Track a tool invocation. Identity is the reported call id; without
    /// one, the latest chunk for the same tool whose status precedes the
    /// reported one. Unmatched updates open a fresh chunk. Returns true
    /// when the chunk entered `running`.
    pub fn on_tool_updated(&mut self, transcript: &mut Vec<Message>, tool: &str, state: &ToolState) -> bool {
        if self.finalized {
            tracing::debug!(tool, "Ignoring tool update after finalize");
            return false;
        }
        let Some(chunks) = self.active_chunks(transcript) else {
            return false;
        };

        let existing = chunks.iter().rposition(|chunk| match chunk {
            Chunk::Tool {
                tool: name,
                state: current,
                call_id,
                ..
            } => match &state.call_id {
                Some(wanted) => call_id.as_ref() == Some(wanted),
                None => name == tool && *current < state.status,
            },
            Chunk::Text { .. } | Chunk::Reasoning { .. } => false,
        });

        match existing {
            Some(index) => {
                let Chunk::Tool { state: current, .. } = &mut chunks[index] else {
                    return false;
                };
                if state.status <= *current {
                    tracing::debug!(tool, status = state.status.as_str(), "Ignoring stale tool update");
                    return false;
                }
                *current = state.status;
            }
            None => chunks.push(Chunk::Tool {
                id: new_chunk_id(),
                tool: tool.to_string(),
                state: state.status,
                call_id: state.call_id.clone(),
            }),
        }

        state.status == ToolStatus::Running
    }

    /// Stop mutating the message. Later events are ignored.
    pub fn finalize(&mut self) {
        self.finalized = true;
        self.open = None;
    }

    fn extend(&mut self, transcript: &mut Vec<Message>, kind: ChunkKind, delta: &str) {
        if delta.is_empty() {
            return;
        }
        if self.finalized {
            tracing::debug!(?kind, "Ignoring delta after finalize");
            return;
        }
        let Some(chunks) = self.active_chunks(transcript) else {
            return;
        };

        if let Some(open) = self.open {
            if open.kind == kind && open.index + 1 == chunks.len() {
                match &mut chunks[open.index] {
                    Chunk::Text { text, .. } | Chunk::Reasoning { text, .. } => text.push_str(delta),
                    Chunk::Tool { .. } => {}
                }
                return;
            }
        }

        let id = new_chunk_id();
        let text = delta.to_string();
        chunks.push(match kind {
            ChunkKind::Reasoning => Chunk::Reasoning { id, text },
            ChunkKind::Text | ChunkKind::Tool => Chunk::Text { id, text },
        });
        self.open = Some(OpenChunk {
            index: chunks.len() - 1,
            kind,
        });
    }

    /// Chunk list of the active message, appending an assistant message on
    /// the first content-bearing event of the turn.
    fn active_chunks<'a>(&mut self, transcript: &'a mut Vec<Message>) -> Option<&'a mut Vec<Chunk>> {
        let cursor_valid = self
            .message
            .and_then(|index| transcript.get(index))
            .is_some_and(is_stream_target);

        if !cursor_valid {
            let adopt = transcript
                .last()
                .is_some_and(|last| is_stream_target(last) && !last.canceled);
            if !adopt {
                transcript.push(Message::assistant_stream());
            }
            let index = transcript.len() - 1;
            tracing::debug!(index, "Attached accumulator to assistant message");
            self.message = Some(index);
            self.open = None;
        }

        let index = self.message?;
        match &mut transcript.get_mut(index)?.content {
            MessageContent::Chunks { chunks } => Some(chunks),
            MessageContent::Text { .. } => None,
        }
    }
}

fn is_stream_target(message: &Message) -> bool {
    message.is_assistant() && matches!(message.content, MessageContent::Chunks { .. })
}

fn new_chunk_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
