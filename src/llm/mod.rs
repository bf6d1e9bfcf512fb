// ABOUTME: LLM client module root — chat message types, streaming client, DeepSeek transport
// ABOUTME: Grounded on the teacher's llm/groq.rs request shape and llm/sse_parser.rs framing

mod client;
mod sse_parser;

pub use client::DeepSeekClient;
pub use sse_parser::{create_sse_stream, SseEvent, SseLineBuffer};

use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Contract for the LLM client (spec.md §4.1): issue a chat-completion
/// request with streaming transport, accumulate a full textual reply, and
/// enforce connection/streaming duration limits and token clamping.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a full textual reply for a system/user prompt pair.
    ///
    /// # Errors
    ///
    /// Fails with one of the error kinds in spec.md §4.1: `AUTH_ERROR`,
    /// `QUOTA_EXCEEDED`, `RATE_LIMITED`, `AI_TIMEOUT`, `AI_ERROR`.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens_hint: u32,
    ) -> Result<String, AppError>;
}
