use crate::domain::ports::TextStream;
use crate::utils::error::{Result, ToolError};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// Splits a byte stream into newline-terminated lines, keeping partial lines
/// across chunk boundaries.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes and returns the complete, non-blank lines they finished.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.iter().all(|b| b.is_ascii_whitespace()) {
                lines.push(line);
            }
        }
        lines
    }

    /// Returns the trailing line when the stream ends without a newline.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(|b| b.is_ascii_whitespace()) {
            None
        } else {
            Some(rest)
        }
    }
}

/// What a single NDJSON line means for the text stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Skip,
    Done,
}

struct DecodeState<S, F> {
    bytes: Pin<Box<S>>,
    decoder: NdjsonDecoder,
    parse: F,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl<S, F> DecodeState<S, F>
where
    F: Fn(&[u8]) -> Result<Frame>,
{
    fn accept(&mut self, line: &[u8]) {
        if self.finished {
            return;
        }
        match (self.parse)(line) {
            Ok(Frame::Text(text)) => self.pending.push_back(Ok(text)),
            Ok(Frame::Skip) => {}
            Ok(Frame::Done) => self.finished = true,
            Err(e) => {
                self.pending.push_back(Err(e));
                self.finished = true;
            }
        }
    }
}

/// Turns a chunked NDJSON body into a [`TextStream`]. The stream ends at the
/// first [`Frame::Done`] or after the first error.
pub fn text_stream<S, B, E, F>(bytes: S, parse: F) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ToolError> + Send + 'static,
    F: Fn(&[u8]) -> Result<Frame> + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: NdjsonDecoder::new(),
        parse,
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for line in state.decoder.push(chunk.as_ref()) {
                        state.accept(&line);
                    }
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e.into()));
                    state.finished = true;
                }
                None => {
                    if let Some(line) = state.decoder.finish() {
                        state.accept(&line);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
