// ABOUTME: Checkpoint store module root — trait + SQLite implementation
// ABOUTME: Grounded on the teacher's database_plugins/mod.rs trait-per-concern style

mod sqlite;

pub use sqlite::SqliteCheckpointStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Checkpoint;
use crate::errors::AppError;

/// Persists and reloads per-phase intermediate artifacts keyed by job id
/// (spec.md §4.6). `save` is idempotent and monotonic — later phases
/// overwrite earlier ones. Save failures are non-fatal to the orchestrator
/// (checkpointing is an optimization for resumption, not a correctness
/// requirement within a single invocation); callers should log and continue
/// rather than propagate.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist `payload` at `phase` for `job_id`. Phase N's payload carries
    /// everything from phases <N (spec.md §4.6, §8 property 2).
    async fn save(&self, job_id: Uuid, phase: i32, payload: &Checkpoint) -> Result<(), AppError>;

    /// Load the most recently saved checkpoint for `job_id`, if any.
    async fn load(&self, job_id: Uuid) -> Result<Option<Checkpoint>, AppError>;
}
