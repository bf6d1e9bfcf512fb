// ABOUTME: Line-buffering SSE parser for LLM streaming responses
// ABOUTME: Handles partial lines across TCP boundaries and multiple events per chunk
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Adapted from the teacher's `llm::sse_parser` module. Solves the same two
//! correctness issues: multiple `data:` events landing in a single TCP
//! chunk, and a JSON payload split across chunk boundaries.

use std::mem;

/// A parsed SSE event, framing stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with the JSON string (prefix stripped).
    Data(String),
    /// The `data: [DONE]` termination line.
    Done,
}

/// Line-buffering SSE parser.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: String,
}

impl SseLineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from a TCP chunk, returning any complete SSE events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let text = String::from_utf8_lossy(bytes);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim_end_matches('\r').to_owned();
            self.buffer = self.buffer[newline_pos + 1..].to_owned();
            if let Some(event) = Self::parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush any remaining buffered content once the byte stream ends.
    pub fn flush(&mut self) -> Vec<SseEvent> {
        let remaining = mem::take(&mut self.buffer);
        Self::parse_line(&remaining).into_iter().collect()
    }

    fn parse_line(line: &str) -> Option<SseEvent> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed == "data: [DONE]" {
            return Some(SseEvent::Done);
        }
        let data = trimmed.strip_prefix("data: ")?;
        if data.trim().is_empty() {
            return None;
        }
        Some(SseEvent::Data(data.to_owned()))
    }
}

/// Drive a byte stream through an [`SseLineBuffer`], invoking `on_delta` for
/// every parsed delta string and returning once `[DONE]` or the underlying
/// stream ends.
///
/// This is a synchronous fold helper; [`crate::llm::DeepSeekClient`] drives
/// it from an async `bytes_stream()` loop so the two timers (connection,
/// streaming) remain the caller's responsibility.
pub fn create_sse_stream<'a>(
    buffer: &'a mut SseLineBuffer,
    bytes: &[u8],
) -> impl Iterator<Item = SseEvent> + 'a {
    buffer.feed(bytes).into_iter()
}
