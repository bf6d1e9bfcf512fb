// ABOUTME: Environment-derived worker configuration
// ABOUTME: Gathers every timeout/budget/phase tunable into one record passed explicitly downstream
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Typed configuration loaded once from the environment.
//!
//! The source this spec was distilled from reads module-level timing
//! constants and `process.env` lookups directly inside request handlers.
//! Per the Design Notes ("Ambient-state removal"), every tunable is
//! gathered here into one [`WorkerConfig`] and threaded explicitly into the
//! orchestrator and worker loop — no module reaches back into `std::env`
//! after startup.

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Deployment environment, mirrors the teacher's `config::environment::Environment`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with a development fallback.
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Strongly typed log level, mirrors the teacher's `config::environment::LogLevel`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn as_filter_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Checkpoint phase constants (spec.md §4.6).
pub mod phase {
    pub const NONE: i32 = 0;
    pub const SPLIT_COMPLETE: i32 = 1;
    pub const BASE_NUTRITION_COMPLETE: i32 = 2;
    pub const WORKOUTS_COMPLETE: i32 = 3;
    pub const NUTRITION_ADJUST_COMPLETE: i32 = 4;
    pub const SUPPLEMENTS_COMPLETE: i32 = 5;
    pub const VERIFIERS_COMPLETE: i32 = 6;
    pub const REASONS_COMPLETE: i32 = 7;
}

/// All timeouts and budgets, in milliseconds unless noted (spec.md §5).
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Total wall-clock budget for one worker invocation.
    pub invocation_budget_ms: u64,
    /// Remaining-time floor below which the orchestrator must yield.
    pub yield_threshold_ms: u64,
    /// Job lease duration granted on claim.
    pub lease_seconds: u64,
    /// How often the heartbeat ticker extends the lease.
    pub heartbeat_period_ms: u64,
    /// Deadline from request start to response headers for an LLM call.
    pub llm_connection_ms: u64,
    /// Deadline from first byte to stream end for an LLM call.
    pub llm_streaming_ms: u64,
    /// Minimum accumulated characters to treat a timed-out stream as complete-enough.
    pub llm_soft_complete_floor_chars: usize,
    /// Minimum valid response length; shorter responses fail with `AI_ERROR`.
    pub llm_min_response_chars: usize,
    /// Hard clamp on the `maxTokensHint` passed to the LLM client.
    pub llm_max_tokens_clamp: u32,
    /// Lease shrink duration on yield, so another worker can claim promptly.
    pub yield_lease_seconds: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            invocation_budget_ms: 120_000,
            yield_threshold_ms: 25_000,
            lease_seconds: 180,
            heartbeat_period_ms: 30_000,
            llm_connection_ms: 60_000,
            llm_streaming_ms: 55_000,
            llm_soft_complete_floor_chars: 2_000,
            llm_min_response_chars: 20,
            llm_max_tokens_clamp: 8_192,
            yield_lease_seconds: 1,
        }
    }
}

impl Timeouts {
    #[must_use]
    pub const fn invocation_budget(&self) -> Duration {
        Duration::from_millis(self.invocation_budget_ms)
    }

    #[must_use]
    pub const fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_period_ms)
    }

    #[must_use]
    pub const fn llm_connection(&self) -> Duration {
        Duration::from_millis(self.llm_connection_ms)
    }

    #[must_use]
    pub const fn llm_streaming(&self) -> Duration {
        Duration::from_millis(self.llm_streaming_ms)
    }
}

/// Top-level configuration record threaded through the worker and orchestrator.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub environment: Environment,
    pub log_level: LogLevel,
    /// Base URL of the shared relational data store (external collaborator).
    pub data_store_url: String,
    /// Service-role credential for the data store.
    pub data_store_service_key: String,
    /// API key for the external LLM service.
    pub llm_api_key: String,
    pub timeouts: Timeouts,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::config`] if `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY`,
    /// or `DEEPSEEK_API_KEY` is missing, matching spec.md §6's preflight contract:
    /// missing any required variable must fail before a job is ever claimed.
    pub fn from_env() -> Result<Self, AppError> {
        let data_store_url = required_env("SUPABASE_URL")?;
        let data_store_service_key = required_env("SUPABASE_SERVICE_ROLE_KEY")?;
        let llm_api_key = required_env("DEEPSEEK_API_KEY")?;

        let environment = Environment::from_str_or_default(&env_var_or("APP_ENV", "development"));
        let log_level = LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info"));

        Ok(Self {
            environment,
            log_level,
            data_store_url,
            data_store_service_key,
            llm_api_key,
            timeouts: Timeouts::default(),
        })
    }
}

fn required_env(key: &str) -> Result<String, AppError> {
    env::var(key)
        .map_err(|_| AppError::config(format!("missing required environment variable {key}")))
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// `from_env` mutates no process state itself, but reads three
    /// process-global environment variables; `#[serial]` keeps this test
    /// from racing another test in the same binary that clears or sets the
    /// same keys (mirrors the teacher's use of `serial_test` around its own
    /// environment-dependent config tests).
    #[test]
    #[serial]
    fn from_env_fails_closed_when_a_required_variable_is_missing() {
        let prior = (
            env::var("SUPABASE_URL"),
            env::var("SUPABASE_SERVICE_ROLE_KEY"),
            env::var("DEEPSEEK_API_KEY"),
        );
        env::remove_var("SUPABASE_URL");
        env::remove_var("SUPABASE_SERVICE_ROLE_KEY");
        env::remove_var("DEEPSEEK_API_KEY");

        let err = WorkerConfig::from_env().expect_err("missing vars must fail preflight");
        assert!(err.to_string().contains("SUPABASE_URL"));

        if let Ok(v) = prior.0 {
            env::set_var("SUPABASE_URL", v);
        }
        if let Ok(v) = prior.1 {
            env::set_var("SUPABASE_SERVICE_ROLE_KEY", v);
        }
        if let Ok(v) = prior.2 {
            env::set_var("DEEPSEEK_API_KEY", v);
        }
    }

    #[test]
    #[serial]
    fn from_env_succeeds_when_all_required_variables_are_present() {
        let prior = (
            env::var("SUPABASE_URL"),
            env::var("SUPABASE_SERVICE_ROLE_KEY"),
            env::var("DEEPSEEK_API_KEY"),
        );
        env::set_var("SUPABASE_URL", "https://example.supabase.co");
        env::set_var("SUPABASE_SERVICE_ROLE_KEY", "service-role-key");
        env::set_var("DEEPSEEK_API_KEY", "sk-test-key");

        let config = WorkerConfig::from_env().expect("all required vars are present");
        assert_eq!(config.data_store_url, "https://example.supabase.co");

        for (key, value) in [
            ("SUPABASE_URL", prior.0),
            ("SUPABASE_SERVICE_ROLE_KEY", prior.1),
            ("DEEPSEEK_API_KEY", prior.2),
        ] {
            match value {
                Ok(v) => env::set_var(key, v),
                Err(_) => env::remove_var(key),
            }
        }
    }

    #[test]
    fn timeouts_match_spec_constants() {
        let t = Timeouts::default();
        assert_eq!(t.invocation_budget_ms, 120_000);
        assert_eq!(t.yield_threshold_ms, 25_000);
        assert_eq!(t.lease_seconds, 180);
        assert_eq!(t.heartbeat_period_ms, 30_000);
        assert_eq!(t.llm_connection_ms, 60_000);
        assert_eq!(t.llm_streaming_ms, 55_000);
        assert_eq!(t.llm_soft_complete_floor_chars, 2_000);
        assert_eq!(t.llm_max_tokens_clamp, 8_192);
    }

    #[test]
    fn log_level_falls_back_to_info() {
        assert_eq!(LogLevel::from_str_or_default("bogus"), LogLevel::Info);
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
    }
}
