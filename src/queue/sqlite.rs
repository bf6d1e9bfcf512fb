// ABOUTME: SQLite job queue — atomic claim/extend/complete/fail via UPDATE...WHERE...RETURNING
// ABOUTME: Grounded on the teacher's database_plugins/sqlite.rs consume_auth_code/consume_refresh_token pattern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{info, instrument};
use uuid::Uuid;

use super::JobQueue;
use crate::domain::{Checkpoint, Job, JobStatus, ProfileSnapshot, RedoContext};
use crate::errors::AppError;

/// SQLite-backed [`JobQueue`]. `claim` and `extend_lease` are expressed as
/// single conditional `UPDATE ... WHERE ... RETURNING` statements (SQLite
/// 3.35+) rather than a read-then-write round trip, per the Design Notes'
/// explicit requirement (spec.md §9 "Queue atomicity").
pub struct SqliteJobQueue {
    pool: SqlitePool,
}

impl SqliteJobQueue {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `plan_generation_jobs` table if it does not already exist.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plan_generation_jobs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                profile TEXT NOT NULL,
                status TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                max_retries INTEGER NOT NULL DEFAULT 3,
                target_plan_id TEXT,
                cycle_week_start TEXT,
                checkpoint_phase INTEGER NOT NULL DEFAULT 0,
                checkpoint TEXT,
                redo TEXT,
                lease_holder TEXT,
                lease_expiry TEXT,
                created_at TEXT NOT NULL,
                claimed_at TEXT,
                completed_at TEXT,
                last_error TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a brand-new job in `pending` state. Not part of the
    /// [`JobQueue`] trait (job creation is an external collaborator's
    /// responsibility per spec.md §1) but needed to exercise the adapter in
    /// tests and local development.
    pub async fn enqueue(&self, job: &Job) -> Result<(), AppError> {
        let profile_json = serde_json::to_string(&job.profile)?;
        let checkpoint_json = job
            .checkpoint
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let redo_json = job.redo.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r"
            INSERT INTO plan_generation_jobs
                (id, user_id, profile, status, retry_count, max_retries, target_plan_id,
                 cycle_week_start, checkpoint_phase, checkpoint, redo, lease_holder,
                 lease_expiry, created_at, claimed_at, completed_at, last_error)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ",
        )
        .bind(job.id.to_string())
        .bind(job.user_id.to_string())
        .bind(profile_json)
        .bind(status_token(job.status))
        .bind(job.retry_count)
        .bind(job.max_retries)
        .bind(job.target_plan_id.map(|id| id.to_string()))
        .bind(job.cycle_week_start.map(|d| d.to_string()))
        .bind(job.checkpoint_phase)
        .bind(checkpoint_json)
        .bind(redo_json)
        .bind(&job.lease_holder)
        .bind(job.lease_expiry)
        .bind(job.created_at)
        .bind(job.claimed_at)
        .bind(job.completed_at)
        .bind(&job.last_error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn status_token(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Generating => "generating",
        JobStatus::Generated => "generated",
        JobStatus::Failed => "failed",
        JobStatus::Completed => "completed",
    }
}

fn parse_status(token: &str) -> JobStatus {
    match token {
        "generating" => JobStatus::Generating,
        "generated" => JobStatus::Generated,
        "failed" => JobStatus::Failed,
        "completed" => JobStatus::Completed,
        _ => JobStatus::Pending,
    }
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job, AppError> {
    let id: String = row.try_get("id").map_err(AppError::from)?;
    let user_id: String = row.try_get("user_id").map_err(AppError::from)?;
    let profile_json: String = row.try_get("profile").map_err(AppError::from)?;
    let status_token: String = row.try_get("status").map_err(AppError::from)?;
    let target_plan_id: Option<String> = row.try_get("target_plan_id").map_err(AppError::from)?;
    let cycle_week_start: Option<String> =
        row.try_get("cycle_week_start").map_err(AppError::from)?;
    let checkpoint_json: Option<String> = row.try_get("checkpoint").map_err(AppError::from)?;
    let redo_json: Option<String> = row.try_get("redo").map_err(AppError::from)?;

    let profile: ProfileSnapshot = serde_json::from_str(&profile_json)?;
    let checkpoint: Option<Checkpoint> = checkpoint_json
        .map(|s| serde_json::from_str(&s))
        .transpose()?;
    let redo: Option<RedoContext> = redo_json.map(|s| serde_json::from_str(&s)).transpose()?;

    Ok(Job {
        id: Uuid::parse_str(&id).map_err(|e| AppError::db(e.to_string()))?,
        user_id: Uuid::parse_str(&user_id).map_err(|e| AppError::db(e.to_string()))?,
        profile,
        status: parse_status(&status_token),
        retry_count: row.try_get::<i64, _>("retry_count").map_err(AppError::from)? as u32,
        max_retries: row.try_get::<i64, _>("max_retries").map_err(AppError::from)? as u32,
        target_plan_id: target_plan_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| AppError::db(e.to_string()))?,
        cycle_week_start: cycle_week_start
            .map(|s| s.parse::<NaiveDate>())
            .transpose()
            .map_err(|e| AppError::db(e.to_string()))?,
        checkpoint_phase: row.try_get("checkpoint_phase").map_err(AppError::from)?,
        checkpoint,
        redo,
        lease_holder: row.try_get("lease_holder").map_err(AppError::from)?,
        lease_expiry: row.try_get("lease_expiry").map_err(AppError::from)?,
        created_at: row.try_get("created_at").map_err(AppError::from)?,
        claimed_at: row.try_get("claimed_at").map_err(AppError::from)?,
        completed_at: row.try_get("completed_at").map_err(AppError::from)?,
        last_error: row.try_get("last_error").map_err(AppError::from)?,
    })
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    #[instrument(skip(self), fields(worker_id))]
    async fn claim(&self, worker_id: &str, lease_seconds: u64) -> Result<Option<Job>, AppError> {
        let now = Utc::now();
        let lease_expiry = now + chrono::Duration::seconds(i64::try_from(lease_seconds).unwrap_or(i64::MAX));

        let row = sqlx::query(
            r"
            UPDATE plan_generation_jobs
            SET status = 'generating',
                lease_holder = ?1,
                lease_expiry = ?2,
                claimed_at = ?3
            WHERE id = (
                SELECT id FROM plan_generation_jobs
                WHERE (status = 'pending' AND (lease_expiry IS NULL OR lease_expiry < ?3))
                   OR (status = 'generating' AND lease_expiry IS NOT NULL AND lease_expiry < ?3)
                ORDER BY created_at ASC
                LIMIT 1
            )
            RETURNING id, user_id, profile, status, retry_count, max_retries, target_plan_id,
                      cycle_week_start, checkpoint_phase, checkpoint, redo, lease_holder,
                      lease_expiry, created_at, claimed_at, completed_at, last_error
            ",
        )
        .bind(worker_id)
        .bind(lease_expiry)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let job = row_to_job(&row)?;
                info!(job_id = %job.id, worker_id, "claimed job");
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, profile, status, retry_count, max_retries, target_plan_id,
                   cycle_week_start, checkpoint_phase, checkpoint, redo, lease_holder,
                   lease_expiry, created_at, claimed_at, completed_at, last_error
            FROM plan_generation_jobs WHERE id = ?1
            ",
        )
        .bind(job_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_job).transpose()
    }

    #[instrument(skip(self), fields(job_id = %job_id, worker_id))]
    async fn extend_lease(
        &self,
        job_id: Uuid,
        worker_id: &str,
        extension_seconds: u64,
    ) -> Result<bool, AppError> {
        let new_expiry =
            Utc::now() + chrono::Duration::seconds(i64::try_from(extension_seconds).unwrap_or(i64::MAX));

        let result = sqlx::query(
            r"
            UPDATE plan_generation_jobs
            SET lease_expiry = ?1
            WHERE id = ?2 AND lease_holder = ?3
            ",
        )
        .bind(new_expiry)
        .bind(job_id.to_string())
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn shrink_lease(
        &self,
        job_id: Uuid,
        worker_id: &str,
        lease_seconds: u64,
    ) -> Result<bool, AppError> {
        self.extend_lease(job_id, worker_id, lease_seconds).await
    }

    async fn complete(&self, job_id: Uuid, plan_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r"
            UPDATE plan_generation_jobs
            SET status = 'completed', target_plan_id = ?1, completed_at = ?2
            WHERE id = ?3
            ",
        )
        .bind(plan_id.to_string())
        .bind(Utc::now())
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, message), fields(job_id = %job_id, code))]
    async fn fail(&self, job_id: Uuid, message: &str, code: &str) -> Result<(), AppError> {
        let formatted = format!("{code}: {message}");

        sqlx::query(
            r"
            UPDATE plan_generation_jobs
            SET
                status = CASE WHEN retry_count + 1 >= max_retries THEN 'failed' ELSE 'pending' END,
                retry_count = retry_count + 1,
                last_error = ?1,
                lease_holder = CASE WHEN retry_count + 1 >= max_retries THEN lease_holder ELSE NULL END,
                lease_expiry = CASE WHEN retry_count + 1 >= max_retries THEN lease_expiry ELSE NULL END
            WHERE id = ?2
            ",
        )
        .bind(formatted)
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_checkpoint_phase(&self, job_id: Uuid, phase: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE plan_generation_jobs SET checkpoint_phase = ?1 WHERE id = ?2")
            .bind(phase)
            .bind(job_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Goal;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashSet;

    async fn queue() -> SqliteJobQueue {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite connects");
        let queue = SqliteJobQueue::new(pool);
        queue.migrate().await.expect("migration succeeds");
        queue
    }

    fn sample_profile() -> ProfileSnapshot {
        ProfileSnapshot {
            goal: Goal::GeneralFitness,
            training_days_per_week: 4,
            equipment: HashSet::new(),
            dietary_preferences: HashSet::new(),
            meal_count: 3,
            age: None,
            sex: None,
            height_cm: None,
            weight_kg: None,
            activity_level: None,
            explicit_calorie_target: None,
            current_supplements: Vec::new(),
            avoid_exercises: Vec::new(),
            avoid_foods: Vec::new(),
            injuries: Vec::new(),
            time_window_preferences: Vec::new(),
            special_requests: None,
            regeneration_request: None,
        }
    }

    fn sample_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            profile: sample_profile(),
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries: 3,
            target_plan_id: None,
            cycle_week_start: None,
            checkpoint_phase: 0,
            checkpoint: None,
            redo: None,
            lease_holder: None,
            lease_expiry: None,
            created_at: Utc::now(),
            claimed_at: None,
            completed_at: None,
            last_error: None,
        }
    }

    #[tokio::test]
    async fn claim_picks_a_pending_job_and_sets_the_lease() {
        let queue = queue().await;
        let job = sample_job();
        queue.enqueue(&job).await.expect("enqueue succeeds");

        let claimed = queue
            .claim("worker_1", 180)
            .await
            .expect("claim succeeds")
            .expect("a job was eligible");

        assert_eq!(claimed.id, job.id);
        assert_eq!(claimed.status, JobStatus::Generating);
        assert_eq!(claimed.lease_holder.as_deref(), Some("worker_1"));
    }

    #[tokio::test]
    async fn second_claim_finds_nothing_while_lease_is_held() {
        let queue = queue().await;
        queue.enqueue(&sample_job()).await.expect("enqueue succeeds");
        queue.claim("worker_1", 180).await.expect("first claim succeeds");

        let second = queue.claim("worker_2", 180).await.expect("claim call succeeds");
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn extend_lease_fails_for_a_non_holder() {
        let queue = queue().await;
        let job = sample_job();
        queue.enqueue(&job).await.expect("enqueue succeeds");
        queue.claim("worker_1", 180).await.expect("claim succeeds");

        let extended = queue
            .extend_lease(job.id, "worker_2", 180)
            .await
            .expect("extend call succeeds");
        assert!(!extended);

        let extended = queue
            .extend_lease(job.id, "worker_1", 180)
            .await
            .expect("extend call succeeds");
        assert!(extended);
    }

    #[tokio::test]
    async fn fail_returns_job_to_pending_while_retries_remain() {
        let queue = queue().await;
        let job = sample_job();
        queue.enqueue(&job).await.expect("enqueue succeeds");
        queue.claim("worker_1", 180).await.expect("claim succeeds");

        queue
            .fail(job.id, "stream exceeded deadline", "AI_TIMEOUT")
            .await
            .expect("fail succeeds");

        let reloaded = queue.get(job.id).await.expect("get succeeds").expect("job exists");
        assert_eq!(reloaded.status, JobStatus::Pending);
        assert_eq!(reloaded.retry_count, 1);
    }

    #[tokio::test]
    async fn fail_transitions_to_terminal_failed_once_retries_exhausted() {
        let queue = queue().await;
        let mut job = sample_job();
        job.max_retries = 1;
        queue.enqueue(&job).await.expect("enqueue succeeds");
        queue.claim("worker_1", 180).await.expect("claim succeeds");

        queue
            .fail(job.id, "unexpected panic", "UNEXPECTED_ERROR")
            .await
            .expect("fail succeeds");

        let reloaded = queue.get(job.id).await.expect("get succeeds").expect("job exists");
        assert_eq!(reloaded.status, JobStatus::Failed);
        assert_eq!(reloaded.retry_count, 1);
    }

    #[tokio::test]
    async fn complete_stores_the_plan_reference() {
        let queue = queue().await;
        let job = sample_job();
        queue.enqueue(&job).await.expect("enqueue succeeds");
        queue.claim("worker_1", 180).await.expect("claim succeeds");

        let plan_id = Uuid::new_v4();
        queue.complete(job.id, plan_id).await.expect("complete succeeds");

        let reloaded = queue.get(job.id).await.expect("get succeeds").expect("job exists");
        assert_eq!(reloaded.status, JobStatus::Completed);
        assert_eq!(reloaded.target_plan_id, Some(plan_id));
    }
}
