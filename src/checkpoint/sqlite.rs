// ABOUTME: SQLite checkpoint store — phase/payload upsert keyed by job id
// ABOUTME: Grounded on the teacher's database_plugins/sqlite.rs sqlx::query usage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use super::CheckpointStore;
use crate::domain::Checkpoint;
use crate::errors::AppError;

/// SQLite-backed [`CheckpointStore`]. One row per job, upserted on every save
/// so a later phase's payload simply replaces the earlier row (spec.md §4.6
/// "later phases overwrite earlier").
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `plan_checkpoints` table if it does not already exist.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plan_checkpoints (
                job_id TEXT PRIMARY KEY,
                phase INTEGER NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    #[instrument(skip(self, payload), fields(job_id = %job_id, phase))]
    async fn save(&self, job_id: Uuid, phase: i32, payload: &Checkpoint) -> Result<(), AppError> {
        let payload_json = serde_json::to_string(payload)?;

        sqlx::query(
            r"
            INSERT INTO plan_checkpoints (job_id, phase, payload, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(job_id) DO UPDATE SET
                phase = excluded.phase,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(job_id.to_string())
        .bind(phase)
        .bind(payload_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, job_id: Uuid) -> Result<Option<Checkpoint>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM plan_checkpoints WHERE job_id = ?1")
                .bind(job_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((payload_json,)) => Ok(Some(serde_json::from_str(&payload_json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteCheckpointStore {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite connects");
        let store = SqliteCheckpointStore::new(pool);
        store.migrate().await.expect("migration succeeds");
        store
    }

    #[tokio::test]
    async fn load_returns_none_for_unknown_job() {
        let store = store().await;
        let result = store.load(Uuid::new_v4()).await.expect("load succeeds");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = store().await;
        let job_id = Uuid::new_v4();
        let checkpoint = Checkpoint {
            phase: 1,
            ..Checkpoint::default()
        };
        store.save(job_id, 1, &checkpoint).await.expect("save succeeds");

        let loaded = store.load(job_id).await.expect("load succeeds").expect("row exists");
        assert_eq!(loaded.phase, 1);
    }

    #[tokio::test]
    async fn later_save_overwrites_earlier_phase() {
        let store = store().await;
        let job_id = Uuid::new_v4();

        store
            .save(job_id, 1, &Checkpoint { phase: 1, ..Checkpoint::default() })
            .await
            .expect("first save succeeds");
        store
            .save(job_id, 2, &Checkpoint { phase: 2, ..Checkpoint::default() })
            .await
            .expect("second save succeeds");

        let loaded = store.load(job_id).await.expect("load succeeds").expect("row exists");
        assert_eq!(loaded.phase, 2);
    }
}
