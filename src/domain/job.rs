// ABOUTME: Job record — the unit of work claimed, leased, and advanced by the worker
// ABOUTME: Mirrors spec.md §3's Job attributes and lifecycle states

use super::{Checkpoint, ProfileSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job lifecycle state (spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Generating,
    Generated,
    Failed,
    Completed,
}

/// Which parts of an existing plan a redo should touch (spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedoScope {
    Workout,
    Nutrition,
    Both,
}

/// Redo-specific fields, present only when the job is a redo request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedoContext {
    pub reason: String,
    pub scope: RedoScope,
    /// The plan being revised; its `days` map seeds the redo pipeline.
    pub source_plan_id: Uuid,
}

/// The unit of work consumed by the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile: ProfileSnapshot,
    pub status: JobStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub target_plan_id: Option<Uuid>,
    pub cycle_week_start: Option<chrono::NaiveDate>,
    pub checkpoint_phase: i32,
    pub checkpoint: Option<Checkpoint>,
    pub redo: Option<RedoContext>,

    pub lease_holder: Option<String>,
    pub lease_expiry: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Job {
    /// `true` once `retry_count` has reached `max_retries`, after which
    /// `fail` must transition to terminal `failed` instead of `pending`
    /// (spec.md §4.7).
    #[must_use]
    pub const fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// `true` on the retry that will exhaust the budget — the point at
    /// which a user-visible failure notification is warranted (spec.md §7).
    #[must_use]
    pub const fn is_final_retry(&self) -> bool {
        self.retry_count + 1 >= self.max_retries
    }
}
