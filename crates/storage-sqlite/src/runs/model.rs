//! Database models for collection run audit rows and backfill progress.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use stockpulse_core::prices::{BackfillProgress, BackfillStatus, CollectionRun, CollectionType};

/// Database model for one collection run audit row.
///
/// Inserted when a run starts with zeroed counters, then updated in
/// place when the run finalizes. `errors` holds a JSON array of
/// per-symbol failure messages.
#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::stock_data_collection)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockDataCollectionDB {
    pub id: String,
    pub collection_type: String,
    pub symbols_requested: i32,
    pub symbols_success: i32,
    pub symbols_failed: i32,
    pub errors: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_seconds: Option<f64>,
}

/// Changeset applied to an audit row when its run finishes.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::stock_data_collection)]
pub struct FinalizeCollectionDB {
    pub symbols_success: i32,
    pub symbols_failed: i32,
    pub errors: String,
    pub completed_at: String,
    pub duration_seconds: f64,
}

/// Database model for one backfill progress row.
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::backfill_progress)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BackfillProgressDB {
    pub id: i32,
    pub run_id: String,
    pub symbol: String,
    pub status: String,
    pub records_inserted: i32,
    pub error_message: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

/// Insert payload for progress rows; the id is assigned by SQLite.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::backfill_progress)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewBackfillProgressDB {
    pub run_id: String,
    pub symbol: String,
    pub status: String,
    pub records_inserted: i32,
    pub error_message: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

// Conversion implementations

fn parse_datetime_opt(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|v| {
        DateTime::parse_from_rfc3339(v)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

impl From<&CollectionRun> for StockDataCollectionDB {
    fn from(run: &CollectionRun) -> Self {
        StockDataCollectionDB {
            id: run.id.clone(),
            collection_type: run.run_type.as_str().to_string(),
            symbols_requested: run.symbols_requested as i32,
            symbols_success: 0,
            symbols_failed: 0,
            errors: "[]".to_string(),
            started_at: run.started_at.to_rfc3339(),
            completed_at: None,
            duration_seconds: None,
        }
    }
}

impl From<BackfillProgressDB> for BackfillProgress {
    fn from(db: BackfillProgressDB) -> Self {
        BackfillProgress {
            run_id: db.run_id,
            symbol: db.symbol,
            status: BackfillStatus::from(db.status.as_str()),
            records_inserted: db.records_inserted.max(0) as usize,
            error_message: db.error_message,
            started_at: parse_datetime_opt(db.started_at.as_deref()),
            completed_at: parse_datetime_opt(db.completed_at.as_deref()),
        }
    }
}

impl From<&BackfillProgress> for NewBackfillProgressDB {
    fn from(progress: &BackfillProgress) -> Self {
        NewBackfillProgressDB {
            run_id: progress.run_id.clone(),
            symbol: progress.symbol.clone(),
            status: progress.status.as_str().to_string(),
            records_inserted: progress.records_inserted as i32,
            error_message: progress.error_message.clone(),
            started_at: progress.started_at.map(|dt| dt.to_rfc3339()),
            completed_at: progress.completed_at.map(|dt| dt.to_rfc3339()),
        }
    }
}
