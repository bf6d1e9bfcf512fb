// ABOUTME: Logging configuration and subscriber initialization
// ABOUTME: JSON output in production, pretty output otherwise, following the teacher's posture
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::environment::{Environment, LogLevel};
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration derived from [`super::WorkerConfig`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub environment: Environment,
}

impl LoggingConfig {
    #[must_use]
    pub const fn new(level: LogLevel, environment: Environment) -> Self {
        Self { level, environment }
    }

    /// Install a global `tracing` subscriber for the process.
    ///
    /// JSON output is used in production so log aggregation can parse
    /// structured fields; pretty output is used otherwise for local
    /// readability, matching the teacher's `tracing-subscriber` setup.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_filter_str()));

        if self.environment.is_production() {
            let _ = fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(true)
                .try_init();
        } else {
            let _ = fmt().with_env_filter(filter).pretty().try_init();
        }
    }
}
