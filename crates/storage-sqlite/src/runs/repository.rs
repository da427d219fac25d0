use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use super::model::{
    BackfillProgressDB, FinalizeCollectionDB, NewBackfillProgressDB, StockDataCollectionDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::backfill_progress::dsl as backfill_dsl;
use crate::schema::stock_data_collection::dsl as runs_dsl;
use stockpulse_core::prices::{
    BackfillProgress, BackfillStore, CollectionRun, CollectionRunStore, RunStats,
};
use stockpulse_core::Result;

/// SQLite-backed implementation of [`CollectionRunStore`] and [`BackfillStore`].
pub struct RunRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RunRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Load one audit row, as stored.
    pub fn get_run(&self, run_id: &str) -> Result<Option<StockDataCollectionDB>> {
        let mut conn = get_connection(&self.pool)?;

        runs_dsl::stock_data_collection
            .filter(runs_dsl::id.eq(run_id))
            .first::<StockDataCollectionDB>(&mut conn)
            .optional()
            .into_core()
    }
}

// =============================================================================
// CollectionRunStore Implementation
// =============================================================================

#[async_trait]
impl CollectionRunStore for RunRepository {
    async fn create_run(&self, run: &CollectionRun) -> Result<()> {
        let db_row = StockDataCollectionDB::from(run);

        self.writer
            .exec(move |conn| -> Result<()> {
                diesel::insert_into(runs_dsl::stock_data_collection)
                    .values(&db_row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        stats: &RunStats,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let errors_json = serde_json::to_string(&stats.errors)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let changes = FinalizeCollectionDB {
            symbols_success: stats.success as i32,
            symbols_failed: stats.failed as i32,
            errors: errors_json,
            completed_at: completed_at.to_rfc3339(),
            duration_seconds: stats.duration.as_secs_f64(),
        };
        let run_id = run_id.to_string();

        self.writer
            .exec(move |conn| -> Result<()> {
                diesel::update(runs_dsl::stock_data_collection.filter(runs_dsl::id.eq(run_id)))
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }
}

// =============================================================================
// BackfillStore Implementation
// =============================================================================

#[async_trait]
impl BackfillStore for RunRepository {
    fn get_progress(&self, run_id: &str) -> Result<Vec<BackfillProgress>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = backfill_dsl::backfill_progress
            .filter(backfill_dsl::run_id.eq(run_id))
            .order(backfill_dsl::symbol.asc())
            .load::<BackfillProgressDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(BackfillProgress::from).collect())
    }

    async fn upsert_progress(&self, progress: &BackfillProgress) -> Result<()> {
        let db_row = NewBackfillProgressDB::from(progress);

        self.writer
            .exec(move |conn| -> Result<()> {
                // REPLACE keys on UNIQUE(run_id, symbol)
                diesel::replace_into(backfill_dsl::backfill_progress)
                    .values(&db_row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
