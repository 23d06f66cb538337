/// Callbacks fired while a turn streams. Every slot defaults to a no-op.
pub trait StreamHandlers {
    /// Server accepted the stream and created its working context
    fn on_meta(&mut self) {}

    fn on_reasoning_delta(&mut self, _delta: &str) {}

    fn on_text_delta(&mut self, _delta: &str) {}

    /// A tool invocation entered `running`
    fn on_tool_call(&mut self, _tool: &str) {}

    fn on_error(&mut self, _message: &str) {}
}

impl StreamHandlers for () {}
