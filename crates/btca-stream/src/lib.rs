pub mod buffer_utils;
pub mod decoder;

pub use buffer_utils::{CircularLineBuffer, FrameDecoder, JsonEventDecoder, SseFrame, SseFrameParser};
pub use decoder::{decode_event_stream, decode_event_stream_with, decode_response, EventStream};
