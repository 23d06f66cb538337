use btca_session::StreamHandlers;
use std::io::{self, Write};

/// Prints a streaming answer to a terminal.
///
/// Reasoning is wrapped in `<thinking>` tags, tool starts get their own
/// `[tool]` line and stream errors go to the error writer. Write failures
/// are kept and reported by [`TerminalRenderer::finish`].
pub struct TerminalRenderer<O: Write, E: Write> {
    out: O,
    err: E,
    received_meta: bool,
    in_reasoning: bool,
    has_text: bool,
    io_error: Option<io::Error>,
}

impl TerminalRenderer<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalRenderer<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            received_meta: false,
            in_reasoning: false,
            has_text: false,
            io_error: None,
        }
    }

    /// Status line printed before the stream is requested
    pub fn loading(&mut self) {
        self.write_out("loading resources...\n");
    }

    /// Close any open thinking block and end the answer
    pub fn finish(&mut self) -> io::Result<()> {
        if self.in_reasoning {
            self.write_out("\n</thinking>\n");
            self.in_reasoning = false;
        }
        self.write_out("\n\n");
        self.received_meta = false;
        self.has_text = false;

        match self.io_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn close_thinking(&mut self) {
        if self.in_reasoning {
            self.write_out("\n</thinking>\n\n");
            self.in_reasoning = false;
        }
    }

    fn write_out(&mut self, text: &str) {
        let result = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush());
        self.keep_error(result);
    }

    fn write_err(&mut self, text: &str) {
        let result = self.err.write_all(text.as_bytes());
        self.keep_error(result);
    }

    fn keep_error(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            self.io_error.get_or_insert(e);
        }
    }
}

impl<O: Write, E: Write> StreamHandlers for TerminalRenderer<O, E> {
    fn on_meta(&mut self) {
        if !self.received_meta {
            self.write_out("creating collection...\n\n");
            self.received_meta = true;
        }
    }

    fn on_reasoning_delta(&mut self, delta: &str) {
        if !self.in_reasoning {
            self.write_out("<thinking>\n");
            self.in_reasoning = true;
        }
        self.write_out(delta);
    }

    fn on_text_delta(&mut self, delta: &str) {
        self.close_thinking();
        self.has_text = true;
        self.write_out(delta);
    }

    fn on_tool_call(&mut self, tool: &str) {
        self.close_thinking();
        if self.has_text {
            self.write_out("\n");
        }
        self.write_out(&format!("[{}]\n", tool));
    }

    fn on_error(&mut self, message: &str) {
        self.write_err(&format!("\nError: {}\n", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(drive: impl FnOnce(&mut TerminalRenderer<Vec<u8>, Vec<u8>>)) -> (String, String) {
        let mut renderer = TerminalRenderer::new(Vec::new(), Vec::new());
        drive(&mut renderer);
        renderer.finish().unwrap();
        let (out, err) = renderer.into_inner();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_reasoning_then_text() {
        let (out, err) = render(|r| {
            r.loading();
            r.on_meta();
            r.on_meta();
            r.on_reasoning_delta("foo");
            r.on_reasoning_delta("bar");
            r.on_text_delta("hi");
        });

        assert_eq!(
            out,
            "loading resources...\ncreating collection...\n\n<thinking>\nfoobar\n</thinking>\n\nhi\n\n"
        );
        assert!(err.is_empty());
    }

    #[test]
    fn test_tool_line_after_text() {
        let (out, _) = render(|r| {
            r.on_text_delta("looking");
            r.on_tool_call("grep");
            r.on_text_delta("found");
        });

        assert_eq!(out, "looking\n[grep]\nfound\n\n");
    }

    #[test]
    fn test_unclosed_thinking_is_closed_on_finish() {
        let (out, _) = render(|r| r.on_reasoning_delta("hmm"));
        assert_eq!(out, "<thinking>\nhmm\n</thinking>\n\n\n");
    }

    #[test]
    fn test_errors_go_to_error_writer() {
        let (out, err) = render(|r| {
            r.on_text_delta("partial");
            r.on_error("rate limited");
        });

        assert_eq!(out, "partial\n\n");
        assert_eq!(err, "\nError: rate limited\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_reported_on_finish() {
        let mut renderer = TerminalRenderer::new(BrokenPipe, Vec::new());
        renderer.on_text_delta("lost");
        let err = renderer.finish().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
