//! Price storage traits.
//!
//! This module defines the storage interface for price snapshots, daily
//! history, collection run bookkeeping, backfill progress, and symbol
//! mentions. These traits abstract the persistence layer, allowing
//! different storage backends to be used interchangeably.
//!
//! # Design Notes
//!
//! - Async methods are used for mutations, which go through the single
//!   writer; sync methods are used for reads off the pool
//! - Batch operations are provided where the services work in batches

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::model::{BackfillProgress, CollectionRun, HistoryPoint, PriceSnapshot, RunStats};
use crate::errors::Result;

// =============================================================================
// Price Store
// =============================================================================

/// Storage interface for live price snapshots.
///
/// One snapshot per symbol; upserts replace the existing row.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Gets the cached snapshot for a symbol.
    ///
    /// # Returns
    ///
    /// The snapshot, or None if the symbol has never been cached
    fn get_snapshot(&self, symbol: &str) -> Result<Option<PriceSnapshot>>;

    /// Gets cached snapshots for multiple symbols.
    ///
    /// Symbols without a snapshot are omitted from the map.
    fn get_snapshots(&self, symbols: &[String]) -> Result<HashMap<String, PriceSnapshot>>;

    /// Inserts or replaces one snapshot.
    async fn upsert_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()>;

    /// Inserts or replaces snapshots in a single batch.
    ///
    /// # Returns
    ///
    /// The number of snapshots written
    async fn upsert_snapshots(&self, snapshots: &[PriceSnapshot]) -> Result<usize>;
}

// =============================================================================
// History Store
// =============================================================================

/// Storage interface for daily close history.
///
/// Rows are unique per `(symbol, date)`; inserts silently skip dates the
/// store already has, which makes retries and resumes safe.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Gets the newest history date stored for a symbol.
    fn latest_history_date(&self, symbol: &str) -> Result<Option<NaiveDate>>;

    /// Gets history points for a symbol within a date range, ascending.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The ticker symbol
    /// * `start` - Start date (inclusive)
    /// * `end` - End date (inclusive)
    fn history_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryPoint>>;

    /// Gets the set of dates a symbol already has rows for, within a range.
    fn history_dates(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;

    /// Gets the last close price strictly before a date, if any.
    ///
    /// Used to seed gap filling at the start of a window.
    fn latest_close_before(&self, symbol: &str, date: NaiveDate) -> Result<Option<Decimal>>;

    /// Inserts history points, skipping `(symbol, date)` pairs that exist.
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    async fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize>;

    /// Deletes all history rows for a symbol.
    ///
    /// # Returns
    ///
    /// The number of rows deleted
    async fn delete_history(&self, symbol: &str) -> Result<usize>;
}

// =============================================================================
// Collection Run Store
// =============================================================================

/// Storage interface for collection run audit rows.
#[async_trait]
pub trait CollectionRunStore: Send + Sync {
    /// Creates the run row at the start of a run.
    async fn create_run(&self, run: &CollectionRun) -> Result<()>;

    /// Writes the final stats onto an existing run row.
    async fn finalize_run(
        &self,
        run_id: &str,
        stats: &RunStats,
        completed_at: DateTime<Utc>,
    ) -> Result<()>;
}

// =============================================================================
// Backfill Store
// =============================================================================

/// Storage interface for per-symbol backfill checkpoints.
#[async_trait]
pub trait BackfillStore: Send + Sync {
    /// Gets all progress rows recorded for a run.
    fn get_progress(&self, run_id: &str) -> Result<Vec<BackfillProgress>>;

    /// Inserts or replaces the progress row for `(run_id, symbol)`.
    async fn upsert_progress(&self, progress: &BackfillProgress) -> Result<()>;
}

// =============================================================================
// Mention Store
// =============================================================================

/// Read interface over the news mention data the tracker ingests.
///
/// Mention ingestion lives outside this crate; the collection services
/// only rank and filter what is already stored.
pub trait MentionStore: Send + Sync {
    /// Gets the most mentioned symbols since an instant, most first.
    ///
    /// Ties are broken by symbol, ascending, so rankings are stable.
    ///
    /// # Returns
    ///
    /// Up to `limit` pairs of (symbol, mention count)
    fn top_mentioned(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<(String, i64)>>;

    /// Gets symbols with at least `min_count` mentions over all time.
    fn symbols_with_mentions(&self, min_count: i64) -> Result<Vec<String>>;

    /// Gets all actively tracked symbols, ascending.
    fn tracked_symbols(&self) -> Result<Vec<String>>;
}
