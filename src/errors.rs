// ABOUTME: Centralized error handling for the plan-generation worker
// ABOUTME: Defines the error-kind tokens that double as `fail_plan_job` codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Unified error type for the worker.
//!
//! Every variant's [`std::fmt::Display`] renders the exact upper-snake
//! token spec'd as the error-kind prefix (e.g. `AI_TIMEOUT`), so the token
//! preceding the first colon of a bubbled error message is mechanically the
//! code passed to `fail_plan_job`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error-kind tokens from the spec's error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Missing or invalid worker configuration (env vars, preflight checks).
    ConfigError,
    /// LLM provider rejected credentials.
    AuthError,
    /// LLM provider rate-limited the request.
    RateLimited,
    /// LLM provider reports quota exhaustion.
    QuotaExceeded,
    /// LLM provider returned a non-2xx error other than the above.
    AiError,
    /// LLM call exceeded its connection or streaming deadline.
    AiTimeout,
    /// The JSON recovery parser could not extract valid JSON.
    JsonParseError,
    /// A stage's output failed structural validation.
    ValidationFailed,
    /// The checkpoint or queue store reported a failure.
    DbError,
    /// An unrecoverable error occurred in the generation pipeline.
    GenerationError,
    /// The workout-redo LLM call failed irrecoverably.
    WorkoutRedoFailed,
    /// The nutrition-redo LLM call failed irrecoverably.
    NutritionRedoFailed,
    /// The redo pipeline failed for a reason not covered above.
    RedoFailed,
    /// A panic or unexpected error was caught at the outer boundary.
    UnexpectedError,
}

impl ErrorCode {
    /// The exact token used as the `fail_plan_job` error code and as the
    /// prefix token of bubbled error messages.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::AuthError => "AUTH_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::AiError => "AI_ERROR",
            Self::AiTimeout => "AI_TIMEOUT",
            Self::JsonParseError => "JSON_PARSE_ERROR",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::DbError => "DB_ERROR",
            Self::GenerationError => "GENERATION_ERROR",
            Self::WorkoutRedoFailed => "WORKOUT_REDO_FAILED",
            Self::NutritionRedoFailed => "NUTRITION_REDO_FAILED",
            Self::RedoFailed => "REDO_FAILED",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }

    /// HTTP status a caller-facing envelope would use for this error, kept
    /// for completeness even though the worker itself always answers `200`
    /// with a `status: "failed"` envelope (spec.md §4.9).
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::AuthError => 401,
            Self::QuotaExceeded => 402,
            Self::RateLimited => 429,
            Self::ValidationFailed | Self::JsonParseError => 400,
            Self::ConfigError => 500,
            _ => 502,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The worker's single error type.
#[derive(Debug, Clone, Error)]
pub struct AppError {
    /// Which kind of failure this is.
    pub code: ErrorCode,
    /// Human-readable detail. Never shown to end users verbatim.
    pub message: String,
}

impl AppError {
    /// Build a new error from a code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The `"CODE: message"` form used as `fail_plan_job`'s error message,
    /// from which the code is recovered by taking the token before the
    /// first colon (spec.md §4.9).
    #[must_use]
    pub fn as_queue_message(&self) -> String {
        format!("{}: {}", self.code.token(), self.message)
    }

    /// Sanitized message safe to surface in the worker's JSON envelope.
    /// Internal detail is dropped for everything except validation-shaped
    /// errors, which are already safe to expose.
    #[must_use]
    pub fn sanitized_message(&self) -> String {
        match self.code {
            ErrorCode::ValidationFailed | ErrorCode::JsonParseError => self.message.clone(),
            _ => format!("{}: request failed", self.code.token()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.token(), self.message)
    }
}

/// Result alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors mirroring the spec's error kinds.
impl AppError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthError, message)
    }

    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }

    #[must_use]
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::QuotaExceeded, message)
    }

    #[must_use]
    pub fn ai_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AiError, message)
    }

    #[must_use]
    pub fn ai_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AiTimeout, message)
    }

    #[must_use]
    pub fn json_parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::JsonParseError, message)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    #[must_use]
    pub fn db(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DbError, message)
    }

    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationError, message)
    }

    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnexpectedError, message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::unexpected(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::json_parse(error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::db(error.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        Self::ai_error(error.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(error: chrono::ParseError) -> Self {
        Self::validation(format!("date parse error: {error}"))
    }
}

/// Axum integration: errors become a `200` envelope per spec.md §4.9, never
/// a non-2xx HTTP response, so this is only used by auxiliary routes (e.g.
/// `/health`) that do want normal HTTP semantics.
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.code.http_status())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(serde_json::json!({
            "success": false,
            "error": self.sanitized_message(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_through_queue_message() {
        let err = AppError::ai_timeout("stream exceeded 55s with <2000 chars");
        let msg = err.as_queue_message();
        let code_token = msg.split(':').next().unwrap_or_default();
        assert_eq!(code_token, "AI_TIMEOUT");
    }

    #[test]
    fn validation_message_is_not_redacted() {
        let err = AppError::validation("meal count must be between 1 and 8");
        assert_eq!(
            err.sanitized_message(),
            "meal count must be between 1 and 8"
        );
    }
}
