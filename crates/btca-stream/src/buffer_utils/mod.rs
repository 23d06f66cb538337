mod buffering;
mod sse_parser;

pub use buffering::CircularLineBuffer;
pub use sse_parser::{FrameDecoder, JsonEventDecoder, SseFrame, SseFrameParser};
