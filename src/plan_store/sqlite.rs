// ABOUTME: SQLite plan store — generating/generated lifecycle for the weekly plan row
// ABOUTME: Grounded on the teacher's database_plugins/sqlite.rs sqlx::query usage

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use super::PlanStore;
use crate::domain::{FinalPlanRecord, Job};
use crate::errors::AppError;

/// SQLite-backed [`PlanStore`]. One row per weekly plan, mirroring the
/// `weekly_base_plans` shape spec.md §6 describes: a `status` column
/// (`pending`/`generating`/`generated`), an opaque `days` JSON blob, and the
/// lock/edit-count bookkeeping the final plan record carries once generated.
pub struct SqlitePlanStore {
    pool: SqlitePool,
}

impl SqlitePlanStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `weekly_base_plans` table if it does not already exist.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weekly_base_plans (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL,
                days TEXT,
                locked INTEGER NOT NULL DEFAULT 0,
                edit_counts TEXT,
                generation_job_id TEXT,
                created_at TEXT NOT NULL,
                generated_at TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PlanStore for SqlitePlanStore {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn ensure_generating(&self, job: &Job) -> Result<Uuid, AppError> {
        if let Some(plan_id) = job.target_plan_id {
            sqlx::query("UPDATE weekly_base_plans SET status = 'generating' WHERE id = ?1")
                .bind(plan_id.to_string())
                .execute(&self.pool)
                .await?;
            return Ok(plan_id);
        }

        let plan_id = Uuid::new_v4();
        sqlx::query(
            r"
            INSERT INTO weekly_base_plans
                (id, user_id, status, days, locked, edit_counts, generation_job_id, created_at)
            VALUES (?1, ?2, 'generating', NULL, 0, NULL, ?3, ?4)
            ",
        )
        .bind(plan_id.to_string())
        .bind(job.user_id.to_string())
        .bind(job.id.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(plan_id)
    }

    async fn load_days(&self, plan_id: Uuid) -> Result<Option<FinalPlanRecord>, AppError> {
        let row = sqlx::query(
            "SELECT created_at, days, locked, edit_counts FROM weekly_base_plans WHERE id = ?1",
        )
        .bind(plan_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let days_json: Option<String> = row.try_get("days").map_err(AppError::from)?;
        let Some(days_json) = days_json else {
            return Ok(None);
        };

        let edit_counts_json: Option<String> =
            row.try_get("edit_counts").map_err(AppError::from)?;

        Ok(Some(FinalPlanRecord {
            id: plan_id,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            days: serde_json::from_str(&days_json)?,
            locked: row.try_get::<i64, _>("locked").map_err(AppError::from)? != 0,
            edit_counts: edit_counts_json
                .map(|s| serde_json::from_str(&s))
                .transpose()?
                .unwrap_or_default(),
        }))
    }

    #[instrument(skip(self, plan), fields(plan_id = %plan_id))]
    async fn save_completed(&self, plan_id: Uuid, plan: &FinalPlanRecord) -> Result<(), AppError> {
        let days_json = serde_json::to_string(&plan.days)?;
        let edit_counts_json = serde_json::to_string(&plan.edit_counts)?;

        sqlx::query(
            r"
            UPDATE weekly_base_plans
            SET status = 'generated', days = ?1, locked = ?2, edit_counts = ?3, generated_at = ?4
            WHERE id = ?5
            ",
        )
        .bind(days_json)
        .bind(plan.locked)
        .bind(edit_counts_json)
        .bind(Utc::now())
        .bind(plan_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset_to_pending(&self, plan_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r"
            UPDATE weekly_base_plans
            SET status = 'pending', days = NULL
            WHERE id = ?1 AND status = 'generating'
            ",
        )
        .bind(plan_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
