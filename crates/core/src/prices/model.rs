//! Price domain models.
//!
//! This module contains the core data structures for cached price snapshots,
//! daily history points, collection run bookkeeping, and backfill progress.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockpulse_market_data::{HistoryBar, Quote};

use crate::constants::{MAX_RUN_ERRORS, QUOTE_STALE_AFTER_SECS};

// =============================================================================
// Price Snapshot
// =============================================================================

/// The latest known price for one symbol.
///
/// One row per symbol; a refresh replaces the previous snapshot rather
/// than appending. `updated_at` drives the staleness check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub symbol: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Build a snapshot from a freshly fetched quote.
    pub fn from_quote(symbol: &str, quote: &Quote, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: quote.price,
            previous_close: quote.previous_close,
            change: quote.change,
            change_percent: quote.change_percent,
            market_state: quote.market_state.clone(),
            currency: quote.currency.clone(),
            exchange: quote.exchange.clone(),
            updated_at: now,
        }
    }

    /// Whether this snapshot is too old to serve at the given instant.
    ///
    /// A snapshot exactly at the threshold counts as stale.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.updated_at).num_seconds() >= QUOTE_STALE_AFTER_SECS
    }
}

// =============================================================================
// History Point
// =============================================================================

/// One day of close price history for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub close_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl HistoryPoint {
    /// Build a history point from a provider bar.
    pub fn from_bar(symbol: &str, bar: &HistoryBar, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            date: bar.date,
            close_price: bar.close,
            volume: bar.volume,
            created_at: now,
        }
    }
}

// =============================================================================
// Collection Runs
// =============================================================================

/// Kind of collection work a run performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    Current,
    Historical,
    Backfill,
    GapFill,
}

impl CollectionType {
    /// Returns the string identifier stored with the run.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Current => "current",
            CollectionType::Historical => "historical",
            CollectionType::Backfill => "backfill",
            CollectionType::GapFill => "gap_fill",
        }
    }
}

impl From<&str> for CollectionType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "historical" => CollectionType::Historical,
            "backfill" => CollectionType::Backfill,
            "gap_fill" => CollectionType::GapFill,
            _ => CollectionType::Current,
        }
    }
}

impl std::fmt::Display for CollectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit row for one collection run.
///
/// Created when the run starts and finalized with its stats when it ends,
/// whether or not the run succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRun {
    pub id: String,
    pub run_type: CollectionType,
    pub symbols_requested: usize,
    pub started_at: DateTime<Utc>,
}

impl CollectionRun {
    /// Open a new run record with a fresh id.
    pub fn start(run_type: CollectionType, symbols_requested: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run_type,
            symbols_requested,
            started_at: Utc::now(),
        }
    }
}

/// Aggregate outcome of a collection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Number of symbols the run set out to process.
    pub requested: usize,
    /// Symbols processed successfully.
    pub success: usize,
    /// Symbols that failed.
    pub failed: usize,
    /// Per-symbol error messages, capped so a huge run cannot balloon the row.
    pub errors: Vec<String>,
    /// Wall-clock duration of the run.
    #[serde(skip)]
    pub duration: std::time::Duration,
}

impl RunStats {
    /// Start stats for a run over the given number of symbols.
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    /// Record one symbol processed successfully.
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    /// Record one symbol failure.
    ///
    /// The counter always increments; the message is kept only while the
    /// error list is under its cap.
    pub fn record_failure(&mut self, symbol: &str, message: &str) {
        self.failed += 1;
        if self.errors.len() < MAX_RUN_ERRORS {
            self.errors.push(format!("{}: {}", symbol, message));
        }
    }

    /// Check if the run had no failures.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!(
                "Processed {} of {} symbols successfully in {:.1}s",
                self.success,
                self.requested,
                self.duration.as_secs_f64()
            )
        } else {
            format!(
                "Processed {} of {} symbols with {} failures in {:.1}s",
                self.success,
                self.requested,
                self.failed,
                self.duration.as_secs_f64()
            )
        }
    }
}

// =============================================================================
// Backfill Progress
// =============================================================================

/// Lifecycle state of one symbol inside a backfill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackfillStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl BackfillStatus {
    /// Returns the string identifier stored with the progress row.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackfillStatus::Pending => "pending",
            BackfillStatus::InProgress => "in_progress",
            BackfillStatus::Completed => "completed",
            BackfillStatus::Failed => "failed",
        }
    }
}

impl From<&str> for BackfillStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "in_progress" => BackfillStatus::InProgress,
            "completed" => BackfillStatus::Completed,
            "failed" => BackfillStatus::Failed,
            _ => BackfillStatus::Pending,
        }
    }
}

impl std::fmt::Display for BackfillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-symbol checkpoint for a backfill run.
///
/// One row per `(run_id, symbol)` pair. Resume reads these rows to decide
/// which symbols still need work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackfillProgress {
    pub run_id: String,
    pub symbol: String,
    pub status: BackfillStatus,
    pub records_inserted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BackfillProgress {
    /// Open an in-progress row for a symbol about to be fetched.
    pub fn started(run_id: &str, symbol: &str, now: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.to_string(),
            symbol: symbol.to_string(),
            status: BackfillStatus::InProgress,
            records_inserted: 0,
            error_message: None,
            started_at: Some(now),
            completed_at: None,
        }
    }

    /// Mark the symbol completed with the number of rows it added.
    pub fn complete(&mut self, records_inserted: usize, now: DateTime<Utc>) {
        self.status = BackfillStatus::Completed;
        self.records_inserted = records_inserted;
        self.error_message = None;
        self.completed_at = Some(now);
    }

    /// Mark the symbol failed with the error that stopped it.
    pub fn fail(&mut self, message: &str, now: DateTime<Utc>) {
        self.status = BackfillStatus::Failed;
        self.error_message = Some(message.to_string());
        self.completed_at = Some(now);
    }
}

// =============================================================================
// Gap Fill
// =============================================================================

/// Aggregate outcome of a gap fill pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapFillSummary {
    /// Symbols examined.
    pub symbols_processed: usize,
    /// Calendar dates filled across all symbols.
    pub total_filled: usize,
}
