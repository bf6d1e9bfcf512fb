// ABOUTME: Main library entry point for the 7-day fitness plan generation worker
// ABOUTME: Checkpointed, timeout-bounded, multi-stage LLM pipeline over a leased job queue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Planforge Worker
//!
//! A checkpointed, timeout-bounded background worker that assembles a
//! seven-day fitness plan (workouts, nutrition, supplements, recovery
//! guidance) from a user profile via a multi-stage LLM pipeline.
//!
//! ## Architecture
//!
//! - **[`domain`]**: the job, profile, checkpoint, and plan data model.
//! - **[`config`]**: environment-derived timeouts, budgets, and logging setup.
//! - **[`errors`]**: the unified `AppError`/`ErrorCode` type threaded everywhere.
//! - **[`llm`]**: the streaming chat-completions client and its dual timers.
//! - **[`parser`]**: the eight-stage JSON recovery pipeline for LLM output.
//! - **[`nutrition`]**: deterministic BMR/TDEE/calorie/protein math and food estimation.
//! - **[`prompts`]**: one builder per pipeline stage, producing `{system, user}` pairs.
//! - **[`checkpoint`]**, **[`queue`]**, **[`plan_store`]**: the persistence adapters.
//! - **[`orchestrator`]**: the stage-by-stage pipeline state machine.
//! - **[`notifier`]**: best-effort push/in-app notification after completion or failure.
//! - **[`worker`]**: the invocation loop — claim, heartbeat, invoke, dispatch.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use planforge_worker::config::WorkerConfig;
//! use planforge_worker::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = WorkerConfig::from_env()?;
//!     println!("worker configured for environment: {:?}", config.environment);
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod domain;
pub mod errors;
pub mod llm;
pub mod notifier;
pub mod nutrition;
pub mod orchestrator;
pub mod parser;
pub mod plan_store;
pub mod prompts;
pub mod queue;
pub mod worker;
