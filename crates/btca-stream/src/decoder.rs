use btca_types::StreamEvent;
use futures::{Stream, StreamExt};
use reqwest::Response;
use std::fmt::Display;
use std::pin::Pin;

use crate::buffer_utils::{CircularLineBuffer, FrameDecoder, JsonEventDecoder, SseFrame, SseFrameParser};

/// Lazy, ordered, forward-only sequence of decoded events
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Decode a streaming HTTP response body
pub fn decode_response(response: Response) -> EventStream {
    decode_event_stream(response.bytes_stream())
}

/// Decode any chunked byte source framed as server-sent events
pub fn decode_event_stream<S, B, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    decode_event_stream_with(bytes, JsonEventDecoder)
}

/// Decode with a custom payload strategy.
///
/// Unparseable frames are skipped. A transport failure yields one `error`
/// event and ends the sequence; `done` (or the done marker) ends it too.
pub fn decode_event_stream_with<S, B, E, D>(bytes: S, decoder: D) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    D: FrameDecoder + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut frames = SseFrameParser::new();

        'read: loop {
            match byte_chunks.next().await {
                Some(Ok(chunk)) => {
                    buffer.extend(chunk.as_ref());

                    while let Some(line) = buffer.next_line() {
                        let Some(frame) = frames.push_line(&line) else {
                            continue;
                        };
                        if let Some(event) = decode_frame(&decoder, &frame) {
                            let terminal = event.is_terminal();
                            yield event;
                            if terminal {
                                break 'read;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Event stream transport failed: {}", e);
                    yield StreamEvent::error(format!("Stream error: {}", e));
                    break 'read;
                }
                None => {
                    // source ended without a trailing blank line
                    let last = buffer
                        .take_remainder()
                        .and_then(|line| frames.push_line(&line))
                        .or_else(|| frames.finish());
                    if let Some(event) = last.and_then(|frame| decode_frame(&decoder, &frame)) {
                        yield event;
                    }
                    break 'read;
                }
            }
        }
    })
}

fn decode_frame<D: FrameDecoder>(decoder: &D, frame: &SseFrame) -> Option<StreamEvent> {
    if decoder.is_done_marker(frame.data.trim()) {
        return Some(StreamEvent::done());
    }

    match decoder.decode_frame(frame) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("Skipping undecodable stream record: {} ({})", e, frame.data);
            None
        }
    }
}
