//! Shared mocks for service tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use stockpulse_market_data::{
    FetchError, HistoricalSeries, HistoryBar, HistoryPeriod, Quote, QuoteProvider,
};

use super::model::{BackfillProgress, CollectionRun, HistoryPoint, PriceSnapshot, RunStats};
use super::store::{BackfillStore, CollectionRunStore, HistoryStore, MentionStore, PriceStore};
use crate::errors::Result;

// =========================================================================
// Builders
// =========================================================================

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) fn snapshot(symbol: &str, price: Decimal, updated_at: DateTime<Utc>) -> PriceSnapshot {
    PriceSnapshot {
        symbol: symbol.to_string(),
        price,
        previous_close: None,
        change: None,
        change_percent: None,
        market_state: None,
        currency: None,
        exchange: None,
        updated_at,
    }
}

pub(crate) fn bar(day: &str, close: Decimal) -> HistoryBar {
    HistoryBar {
        date: date(day),
        close,
        volume: Some(1_000),
    }
}

pub(crate) fn point(symbol: &str, day: &str, close: Decimal) -> HistoryPoint {
    HistoryPoint {
        symbol: symbol.to_string(),
        date: date(day),
        close_price: close,
        volume: Some(1_000),
        created_at: Utc::now(),
    }
}

// =========================================================================
// Mock Provider
// =========================================================================

/// Failure a mock provider call should report.
#[derive(Clone, Copy, Debug)]
pub(crate) enum MockFailure {
    RateLimited,
    Timeout,
    NotFound,
    Provider,
}

impl MockFailure {
    fn to_error(self, symbol: &str) -> FetchError {
        match self {
            MockFailure::RateLimited => FetchError::RateLimited {
                provider: "MOCK".to_string(),
            },
            MockFailure::Timeout => FetchError::Timeout {
                provider: "MOCK".to_string(),
            },
            MockFailure::NotFound => FetchError::SymbolNotFound(symbol.to_string()),
            MockFailure::Provider => FetchError::ProviderError {
                provider: "MOCK".to_string(),
                message: "mock provider failure".to_string(),
            },
        }
    }
}

#[derive(Clone, Copy)]
struct FailurePlan {
    kind: MockFailure,
    remaining: u32,
}

/// In-memory provider with scripted quotes, bars, and failures.
#[derive(Clone, Default)]
pub(crate) struct MockProvider {
    quotes: Arc<Mutex<HashMap<String, Option<Quote>>>>,
    bars: Arc<Mutex<HashMap<String, Vec<HistoryBar>>>>,
    failures: Arc<Mutex<HashMap<String, FailurePlan>>>,
    pub price_calls: Arc<Mutex<Vec<String>>>,
    pub multi_calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub history_calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quote(&self, symbol: &str, price: Decimal) {
        self.quotes
            .lock()
            .unwrap()
            .insert(symbol.to_string(), Some(Quote::new(price)));
    }

    /// The provider responds, but has no usable quote for the symbol.
    pub fn set_missing(&self, symbol: &str) {
        self.quotes.lock().unwrap().insert(symbol.to_string(), None);
    }

    pub fn set_bars(&self, symbol: &str, bars: Vec<HistoryBar>) {
        self.bars.lock().unwrap().insert(symbol.to_string(), bars);
    }

    /// Every call touching this symbol fails with the given error.
    pub fn fail_always(&self, symbol: &str, kind: MockFailure) {
        self.failures.lock().unwrap().insert(
            symbol.to_string(),
            FailurePlan {
                kind,
                remaining: u32::MAX,
            },
        );
    }

    /// The next `times` calls touching this symbol fail, then succeed.
    pub fn fail_times(&self, symbol: &str, kind: MockFailure, times: u32) {
        self.failures
            .lock()
            .unwrap()
            .insert(symbol.to_string(), FailurePlan { kind, remaining: times });
    }

    fn check_failure(&self, symbol: &str) -> std::result::Result<(), FetchError> {
        let mut failures = self.failures.lock().unwrap();
        if let Some(plan) = failures.get_mut(symbol) {
            if plan.remaining > 0 {
                if plan.remaining != u32::MAX {
                    plan.remaining -= 1;
                }
                return Err(plan.kind.to_error(symbol));
            }
        }
        Ok(())
    }

    pub fn price_call_count(&self) -> usize {
        self.price_calls.lock().unwrap().len()
    }

    pub fn multi_call_count(&self) -> usize {
        self.multi_calls.lock().unwrap().len()
    }

    pub fn history_call_count(&self) -> usize {
        self.history_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn get_price(&self, symbol: &str) -> std::result::Result<Option<Quote>, FetchError> {
        self.price_calls.lock().unwrap().push(symbol.to_string());
        self.check_failure(symbol)?;
        Ok(self
            .quotes
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or(None))
    }

    async fn get_multiple_prices(
        &self,
        symbols: &[String],
    ) -> std::result::Result<HashMap<String, Option<Quote>>, FetchError> {
        self.multi_calls.lock().unwrap().push(symbols.to_vec());
        // One failing symbol sinks the whole batch, like a real HTTP call
        for symbol in symbols {
            self.check_failure(symbol)?;
        }
        let quotes = self.quotes.lock().unwrap();
        Ok(symbols
            .iter()
            .map(|s| (s.clone(), quotes.get(s).cloned().unwrap_or(None)))
            .collect())
    }

    async fn get_historical(
        &self,
        symbol: &str,
        period: HistoryPeriod,
    ) -> std::result::Result<HistoricalSeries, FetchError> {
        self.history_calls.lock().unwrap().push(symbol.to_string());
        self.check_failure(symbol)?;
        let bars = self
            .bars
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
        Ok(HistoricalSeries {
            symbol: symbol.to_string(),
            currency: Some("USD".to_string()),
            period,
            bars,
        })
    }
}

// =========================================================================
// Mock Price Store
// =========================================================================

#[derive(Clone, Default)]
pub(crate) struct MockPriceStore {
    snapshots: Arc<Mutex<HashMap<String, PriceSnapshot>>>,
    pub upserts: Arc<Mutex<Vec<PriceSnapshot>>>,
    fail_on_write: Arc<Mutex<bool>>,
}

impl MockPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snapshot without recording it as a service write.
    pub fn seed(&self, snapshot: PriceSnapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.symbol.clone(), snapshot);
    }

    pub fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.lock().unwrap() = fail;
    }

    pub fn get(&self, symbol: &str) -> Option<PriceSnapshot> {
        self.snapshots.lock().unwrap().get(symbol).cloned()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceStore for MockPriceStore {
    fn get_snapshot(&self, symbol: &str) -> Result<Option<PriceSnapshot>> {
        Ok(self.snapshots.lock().unwrap().get(symbol).cloned())
    }

    fn get_snapshots(&self, symbols: &[String]) -> Result<HashMap<String, PriceSnapshot>> {
        let snapshots = self.snapshots.lock().unwrap();
        Ok(symbols
            .iter()
            .filter_map(|s| snapshots.get(s).map(|snap| (s.clone(), snap.clone())))
            .collect())
    }

    async fn upsert_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        if *self.fail_on_write.lock().unwrap() {
            return Err(crate::Error::Unexpected("Intentional write failure".into()));
        }
        self.upserts.lock().unwrap().push(snapshot.clone());
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.symbol.clone(), snapshot.clone());
        Ok(())
    }

    async fn upsert_snapshots(&self, snapshots: &[PriceSnapshot]) -> Result<usize> {
        for snapshot in snapshots {
            self.upsert_snapshot(snapshot).await?;
        }
        Ok(snapshots.len())
    }
}

// =========================================================================
// Mock History Store
// =========================================================================

#[derive(Clone, Default)]
pub(crate) struct MockHistoryStore {
    points: Arc<Mutex<BTreeMap<(String, NaiveDate), HistoryPoint>>>,
    pub insert_batches: Arc<Mutex<Vec<usize>>>,
    fail_on_write: Arc<Mutex<bool>>,
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, point: HistoryPoint) {
        self.points
            .lock()
            .unwrap()
            .insert((point.symbol.clone(), point.date), point);
    }

    pub fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.lock().unwrap() = fail;
    }

    /// All stored points for a symbol, ascending by date.
    pub fn all_for(&self, symbol: &str) -> Vec<HistoryPoint> {
        self.points
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn total_points(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

#[async_trait]
impl HistoryStore for MockHistoryStore {
    fn latest_history_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .keys()
            .filter(|(s, _)| s == symbol)
            .map(|(_, d)| *d)
            .max())
    }

    fn history_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryPoint>> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol && p.date >= start && p.date <= end)
            .cloned()
            .collect())
    }

    fn history_dates(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .keys()
            .filter(|(s, d)| s == symbol && *d >= start && *d <= end)
            .map(|(_, d)| *d)
            .collect())
    }

    fn latest_close_before(&self, symbol: &str, date: NaiveDate) -> Result<Option<Decimal>> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol && p.date < date)
            .max_by_key(|p| p.date)
            .map(|p| p.close_price))
    }

    async fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize> {
        if *self.fail_on_write.lock().unwrap() {
            return Err(crate::Error::Unexpected("Intentional write failure".into()));
        }
        let mut stored = self.points.lock().unwrap();
        let mut inserted = 0;
        for point in points {
            let key = (point.symbol.clone(), point.date);
            if let std::collections::btree_map::Entry::Vacant(entry) = stored.entry(key) {
                entry.insert(point.clone());
                inserted += 1;
            }
        }
        self.insert_batches.lock().unwrap().push(inserted);
        Ok(inserted)
    }

    async fn delete_history(&self, symbol: &str) -> Result<usize> {
        let mut stored = self.points.lock().unwrap();
        let before = stored.len();
        stored.retain(|(s, _), _| s != symbol);
        Ok(before - stored.len())
    }
}

// =========================================================================
// Mock Run Store
// =========================================================================

#[derive(Clone, Default)]
pub(crate) struct MockRunStore {
    pub created: Arc<Mutex<Vec<CollectionRun>>>,
    pub finalized: Arc<Mutex<Vec<(String, RunStats)>>>,
}

impl MockRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finalized_stats(&self) -> Vec<RunStats> {
        self.finalized
            .lock()
            .unwrap()
            .iter()
            .map(|(_, stats)| stats.clone())
            .collect()
    }
}

#[async_trait]
impl CollectionRunStore for MockRunStore {
    async fn create_run(&self, run: &CollectionRun) -> Result<()> {
        self.created.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        stats: &RunStats,
        _completed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.finalized
            .lock()
            .unwrap()
            .push((run_id.to_string(), stats.clone()));
        Ok(())
    }
}

// =========================================================================
// Mock Backfill Store
// =========================================================================

#[derive(Clone, Default)]
pub(crate) struct MockBackfillStore {
    rows: Arc<Mutex<HashMap<(String, String), BackfillProgress>>>,
}

impl MockBackfillStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, progress: BackfillProgress) {
        self.rows.lock().unwrap().insert(
            (progress.run_id.clone(), progress.symbol.clone()),
            progress,
        );
    }

    pub fn get(&self, run_id: &str, symbol: &str) -> Option<BackfillProgress> {
        self.rows
            .lock()
            .unwrap()
            .get(&(run_id.to_string(), symbol.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BackfillStore for MockBackfillStore {
    fn get_progress(&self, run_id: &str) -> Result<Vec<BackfillProgress>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn upsert_progress(&self, progress: &BackfillProgress) -> Result<()> {
        self.rows.lock().unwrap().insert(
            (progress.run_id.clone(), progress.symbol.clone()),
            progress.clone(),
        );
        Ok(())
    }
}

// =========================================================================
// Mock Mention Store
// =========================================================================

#[derive(Clone, Default)]
pub(crate) struct MockMentionStore {
    mentions: Arc<Mutex<Vec<(String, DateTime<Utc>)>>>,
    tracked: Arc<Mutex<Vec<String>>>,
}

impl MockMentionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mention(&self, symbol: &str, at: DateTime<Utc>) {
        self.mentions
            .lock()
            .unwrap()
            .push((symbol.to_string(), at));
    }

    pub fn add_mentions(&self, symbol: &str, count: usize, at: DateTime<Utc>) {
        for _ in 0..count {
            self.add_mention(symbol, at);
        }
    }

    pub fn track(&self, symbol: &str) {
        self.tracked.lock().unwrap().push(symbol.to_string());
    }
}

impl MentionStore for MockMentionStore {
    fn top_mentioned(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<(String, i64)>> {
        let mentions = self.mentions.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (symbol, at) in mentions.iter().filter(|(_, at)| *at >= since) {
            *counts.entry(symbol.clone()).or_default() += 1;
        }
        let mut ranked: Vec<(String, i64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    fn symbols_with_mentions(&self, min_count: i64) -> Result<Vec<String>> {
        let mentions = self.mentions.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (symbol, _) in mentions.iter() {
            *counts.entry(symbol.clone()).or_default() += 1;
        }
        let mut symbols: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|(symbol, _)| symbol)
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    fn tracked_symbols(&self) -> Result<Vec<String>> {
        let mut symbols = self.tracked.lock().unwrap().clone();
        symbols.sort();
        Ok(symbols)
    }
}
