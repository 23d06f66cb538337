use anyhow::Result;
use btca_types::StreamEvent;

/// One dispatched server-sent event: the optional `event:` name and the
/// `data:` lines joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Accumulates SSE field lines until a blank line dispatches the frame
#[derive(Debug, Default)]
pub struct SseFrameParser {
    event: Option<String>,
    data: Vec<String>,
}

impl SseFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.finish();
        }

        // comment line
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id and retry carry nothing for us
            _ => {}
        }

        None
    }

    /// Dispatch the pending frame, if any data was collected
    pub fn finish(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

/// Strategy for turning a frame payload into a typed event
pub trait FrameDecoder: Send {
    fn decode_frame(&self, frame: &SseFrame) -> Result<StreamEvent>;

    /// Sentinel payload that ends the stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Payloads are JSON objects tagged by `type`. When the payload has no
/// `type`, the SSE `event:` name is used as the tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEventDecoder;

impl FrameDecoder for JsonEventDecoder {
    fn decode_frame(&self, frame: &SseFrame) -> Result<StreamEvent> {
        let mut value: serde_json::Value = serde_json::from_str(&frame.data)?;

        if let (Some(object), Some(name)) = (value.as_object_mut(), frame.event.as_ref()) {
            object
                .entry("type")
                .or_insert_with(|| serde_json::Value::String(name.clone()));
        }

        Ok(serde_json::from_value(value)?)
    }
}
