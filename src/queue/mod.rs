// ABOUTME: Job queue adapter module root — trait + SQLite implementation
// ABOUTME: Grounded on the teacher's database_plugins/sqlite.rs atomic consume_auth_code pattern

mod sqlite;

pub use sqlite::SqliteJobQueue;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Job;
use crate::errors::AppError;

/// Atomic claim/heartbeat/complete/fail operations over the job table, with a
/// server-side lease (spec.md §4.7). Implementations must perform `claim` and
/// `extend_lease` as server-side conditional updates (`UPDATE ... WHERE ...
/// RETURNING`), never a client-side read-then-write loop (spec.md §9 Design
/// Notes "Queue atomicity").
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Atomically claim one eligible job: `pending` with no lease or an
    /// expired one, or `generating` with an expired lease. Sets
    /// `status=generating`, `lease_holder=worker_id`,
    /// `lease_expiry=now+lease_seconds`. Returns `None` when no job is
    /// eligible.
    async fn claim(&self, worker_id: &str, lease_seconds: u64) -> Result<Option<Job>, AppError>;

    /// Fetch a job by id regardless of lease state, for re-reading the full
    /// record after a claim (spec.md §4.9).
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>, AppError>;

    /// Extend the current lease by `extension_seconds`. Succeeds only when
    /// `worker_id` is the current lease holder; a `false` return means the
    /// lease was lost and the worker must stop mutating the job (spec.md
    /// §4.7, §8 property 1).
    async fn extend_lease(
        &self,
        job_id: Uuid,
        worker_id: &str,
        extension_seconds: u64,
    ) -> Result<bool, AppError>;

    /// Shrink the current lease, used on cooperative yield so another worker
    /// can claim promptly (spec.md §4.9 "Yielded" outcome).
    async fn shrink_lease(
        &self,
        job_id: Uuid,
        worker_id: &str,
        lease_seconds: u64,
    ) -> Result<bool, AppError>;

    /// Transition to `completed` and store the produced plan reference.
    async fn complete(&self, job_id: Uuid, plan_id: Uuid) -> Result<(), AppError>;

    /// Record an error; if `retry_count < max_retries`, increments
    /// `retry_count` and returns the job to `pending`; otherwise transitions
    /// to terminal `failed` (spec.md §4.7).
    async fn fail(&self, job_id: Uuid, message: &str, code: &str) -> Result<(), AppError>;

    /// Persist a checkpoint phase/payload onto the job row itself (mirrors
    /// spec.md §6's `save_plan_checkpoint` RPC shape; the authoritative copy
    /// lives in [`crate::checkpoint::CheckpointStore`] — this keeps the job
    /// record's `checkpoint_phase` column in sync for queue-level queries).
    async fn save_checkpoint_phase(&self, job_id: Uuid, phase: i32) -> Result<(), AppError>;
}
