// ABOUTME: DeepSeek chat-completions client with streaming transport and dual timers
// ABOUTME: Grounded on the teacher's llm/groq.rs OpenAI-compatible request/response shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::sse_parser::{SseEvent, SseLineBuffer};
use super::{ChatMessage, LlmClient};
use crate::config::environment::Timeouts;
use crate::errors::AppError;

const API_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";
const TEMPERATURE: f32 = 0.6;
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ChatRequestBody {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

/// DeepSeek chat-completions provider using an OpenAI-compatible streaming
/// API (spec.md §4.1, §6 "LLM endpoint").
pub struct DeepSeekClient {
    client: Client,
    api_key: String,
    timeouts: Timeouts,
}

impl DeepSeekClient {
    /// Build a client with the given API key and timeout configuration.
    #[must_use]
    pub fn new(api_key: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            timeouts,
        }
    }

    fn api_url(endpoint: &str) -> String {
        format!("{API_BASE_URL}/{endpoint}")
    }

    /// Map a non-2xx status code to the spec's error kinds (spec.md §4.1).
    fn map_status_error(status: reqwest::StatusCode, body: &str) -> AppError {
        let snippet: String = body.chars().take(300).collect();
        match status.as_u16() {
            401 => AppError::auth(format!("DeepSeek authentication failed: {snippet}")),
            402 => AppError::quota_exceeded(format!("DeepSeek quota exceeded: {snippet}")),
            429 => AppError::rate_limited(format!("DeepSeek rate limited: {snippet}")),
            other => AppError::ai_error(format!("DeepSeek returned HTTP {other}: {snippet}")),
        }
    }
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    #[instrument(skip(self, system_prompt, user_prompt), fields(max_tokens_hint))]
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens_hint: u32,
    ) -> Result<String, AppError> {
        let max_tokens = max_tokens_hint.min(self.timeouts.llm_max_tokens_clamp);

        let body = ChatRequestBody {
            model: DEFAULT_MODEL.to_owned(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            temperature: TEMPERATURE,
            max_tokens,
            stream: true,
        };

        let request_start = Instant::now();

        let response = tokio::time::timeout(
            self.timeouts.llm_connection(),
            self.client
                .post(Self::api_url("chat/completions"))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| {
            AppError::ai_timeout(format!(
                "connection timed out after {:?}",
                self.timeouts.llm_connection()
            ))
        })?
        .map_err(|e| AppError::ai_error(format!("failed to connect to DeepSeek: {e}")))?;

        debug!(
            "received response headers after {:?}",
            request_start.elapsed()
        );

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, &body_text));
        }

        let mut byte_stream = response.bytes_stream();
        let mut parser = SseLineBuffer::new();
        let mut accumulated = String::new();
        let stream_start = Instant::now();
        let mut last_progress_log = stream_start;

        loop {
            let elapsed = stream_start.elapsed();
            if elapsed >= self.timeouts.llm_streaming() {
                if accumulated.chars().count() >= self.timeouts.llm_soft_complete_floor_chars {
                    warn!(
                        "stream timer fired after {:?} with {} chars accumulated; returning partial result",
                        elapsed,
                        accumulated.len()
                    );
                    break;
                }
                return Err(AppError::ai_timeout(format!(
                    "stream exceeded {:?} with only {} chars accumulated (floor is {})",
                    self.timeouts.llm_streaming(),
                    accumulated.len(),
                    self.timeouts.llm_soft_complete_floor_chars
                )));
            }

            let remaining = self.timeouts.llm_streaming() - elapsed;
            let next_chunk = tokio::time::timeout(remaining, byte_stream.next()).await;

            let chunk = match next_chunk {
                Ok(Some(Ok(bytes))) => bytes,
                Ok(Some(Err(e))) => {
                    return Err(AppError::ai_error(format!("stream read error: {e}")));
                }
                Ok(None) => {
                    for event in parser.flush() {
                        if let SseEvent::Data(json) = event {
                            Self::apply_delta(&json, &mut accumulated);
                        }
                    }
                    break;
                }
                Err(_) => continue, // loop re-checks elapsed against the deadline
            };

            let mut done = false;
            for event in parser.feed(&chunk) {
                match event {
                    SseEvent::Data(json) => Self::apply_delta(&json, &mut accumulated),
                    SseEvent::Done => done = true,
                }
            }
            if done {
                break;
            }

            if last_progress_log.elapsed() >= PROGRESS_LOG_INTERVAL {
                debug!(
                    "streaming progress: {} chars after {:?}",
                    accumulated.len(),
                    stream_start.elapsed()
                );
                last_progress_log = Instant::now();
            }
        }

        if accumulated.len() < self.timeouts.llm_min_response_chars {
            return Err(AppError::ai_error(format!(
                "response too short ({} chars, minimum {})",
                accumulated.len(),
                self.timeouts.llm_min_response_chars
            )));
        }

        Ok(accumulated)
    }
}

impl DeepSeekClient {
    fn apply_delta(json_str: &str, accumulated: &mut String) {
        match serde_json::from_str::<StreamChunk>(json_str) {
            Ok(chunk) => {
                if let Some(choice) = chunk.choices.into_iter().next() {
                    if let Some(content) = choice.delta.content {
                        accumulated.push_str(&content);
                    }
                }
            }
            Err(e) => warn!("failed to parse DeepSeek stream chunk: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_tokens_clamped_to_8192() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.llm_max_tokens_clamp, 8_192);
        assert_eq!(20_000u32.min(timeouts.llm_max_tokens_clamp), 8_192);
    }

    #[test]
    fn apply_delta_accumulates_content_across_chunks() {
        let mut acc = String::new();
        DeepSeekClient::apply_delta(r#"{"choices":[{"delta":{"content":"hel"}}]}"#, &mut acc);
        DeepSeekClient::apply_delta(r#"{"choices":[{"delta":{"content":"lo"}}]}"#, &mut acc);
        assert_eq!(acc, "hello");
    }

    #[test]
    fn apply_delta_ignores_malformed_json() {
        let mut acc = String::new();
        DeepSeekClient::apply_delta("not json", &mut acc);
        assert_eq!(acc, "");
    }
}
