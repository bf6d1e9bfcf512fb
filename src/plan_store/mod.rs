// ABOUTME: Final plan record store — trait + SQLite implementation
// ABOUTME: Grounded on the teacher's database_plugins/mod.rs trait-per-concern style

mod sqlite;

pub use sqlite::SqlitePlanStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{FinalPlanRecord, Job};
use crate::errors::AppError;

/// Persists the weekly plan record a job ultimately produces (spec.md §3's
/// Final Plan Record, §6's `weekly_base_plans` shape). Separate from
/// [`crate::checkpoint::CheckpointStore`], which holds in-progress pipeline
/// state rather than the finished artifact.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Ensure a plan row exists in `generating` state for this job, creating
    /// one if `job.target_plan_id` is unset or attaching to the existing row
    /// otherwise. Returns the plan id either way (spec.md §4.9 "Fetch the
    /// full job record... ensure a plan record exists in state generating").
    async fn ensure_generating(&self, job: &Job) -> Result<Uuid, AppError>;

    /// Load a previously completed plan's days, used to seed the redo
    /// pipeline (spec.md §4.8 redo path).
    async fn load_days(&self, plan_id: Uuid) -> Result<Option<FinalPlanRecord>, AppError>;

    /// Persist the finished record and mark the row `generated`.
    async fn save_completed(&self, plan_id: Uuid, plan: &FinalPlanRecord) -> Result<(), AppError>;

    /// Clear a `generating` row's days and mark it `pending` again after an
    /// invocation fails, so the next claim's redo/attach logic does not
    /// observe half-written state.
    async fn reset_to_pending(&self, plan_id: Uuid) -> Result<(), AppError>;
}
