//! Batch price collection service.
//!
//! Walks a symbol list in fixed-size batches, one multi-symbol provider
//! call per batch, committing each batch before moving to the next. Every
//! run writes an audit row when it starts and finalizes it with the run
//! stats when it ends, including runs that abort partway.
//!
//! Symbols fail independently: a bad quote or a failed batch marks those
//! symbols failed and the run keeps going. Only storage failures abort
//! the run, and even then the audit row is finalized before the error
//! propagates.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use stockpulse_market_data::{HistoryPeriod, QuoteProvider};

use super::model::{CollectionRun, CollectionType, HistoryPoint, PriceSnapshot, RunStats};
use super::store::{CollectionRunStore, HistoryStore, PriceStore};
use super::validator::quote_is_valid;
use crate::constants::{
    BATCH_PAUSE_SECS, DEFAULT_BATCH_SIZE, HISTORY_COMMIT_CHUNK, RECENT_HISTORY_DAYS,
};
use crate::errors::Result;

/// Collects current and historical prices for lists of symbols.
pub struct CollectorService<S, H, R, P>
where
    S: PriceStore,
    H: HistoryStore,
    R: CollectionRunStore,
    P: QuoteProvider,
{
    prices: Arc<S>,
    history: Arc<H>,
    runs: Arc<R>,
    provider: Arc<P>,
    batch_size: usize,
    batch_pause: Duration,
}

impl<S, H, R, P> CollectorService<S, H, R, P>
where
    S: PriceStore + 'static,
    H: HistoryStore + 'static,
    R: CollectionRunStore + 'static,
    P: QuoteProvider + 'static,
{
    /// Create a collector with the default batch size and pause.
    pub fn new(prices: Arc<S>, history: Arc<H>, runs: Arc<R>, provider: Arc<P>) -> Self {
        Self {
            prices,
            history,
            runs,
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_secs_f64(BATCH_PAUSE_SECS),
        }
    }

    /// Override the number of symbols per provider call.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Override the pause between batches.
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    // =========================================================================
    // Current prices
    // =========================================================================

    /// Fetch and store current prices for all given symbols.
    pub async fn collect_current(&self, symbols: &[String]) -> Result<RunStats> {
        let run = CollectionRun::start(CollectionType::Current, symbols.len());
        self.runs.create_run(&run).await?;
        let started = Instant::now();

        let mut stats = RunStats::new(symbols.len());
        let outcome = self.collect_current_inner(symbols, &mut stats).await;

        stats.duration = started.elapsed();
        self.runs.finalize_run(&run.id, &stats, Utc::now()).await?;
        outcome?;

        info!("Current price run {}: {}", run.id, stats.summary());
        Ok(stats)
    }

    async fn collect_current_inner(&self, symbols: &[String], stats: &mut RunStats) -> Result<()> {
        for (i, chunk) in symbols.chunks(self.batch_size).enumerate() {
            if i > 0 {
                sleep(self.batch_pause).await;
            }

            match self.provider.get_multiple_prices(chunk).await {
                Ok(mut quotes) => {
                    let now = Utc::now();
                    let mut batch = Vec::with_capacity(chunk.len());
                    for symbol in chunk {
                        match quotes
                            .remove(symbol)
                            .flatten()
                            .filter(|q| quote_is_valid(Some(q)))
                        {
                            Some(quote) => {
                                batch.push(PriceSnapshot::from_quote(symbol, &quote, now))
                            }
                            None => stats.record_failure(symbol, "no valid quote returned"),
                        }
                    }

                    if !batch.is_empty() {
                        self.prices.upsert_snapshots(&batch).await?;
                        for _ in &batch {
                            stats.record_success();
                        }
                    }
                }
                Err(e) => {
                    warn!("Batch quote fetch failed for {:?}: {}", chunk, e);
                    for symbol in chunk {
                        stats.record_failure(symbol, &e.to_string());
                    }
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Historical prices
    // =========================================================================

    /// Fetch and store daily history for all given symbols.
    ///
    /// A symbol whose stored history already reaches into the last few
    /// days is skipped and counted as a success, unless `force_refresh`
    /// is set. Forced symbols have their existing rows deleted before the
    /// fetched series is inserted.
    pub async fn collect_historical(
        &self,
        symbols: &[String],
        period: HistoryPeriod,
        force_refresh: bool,
    ) -> Result<RunStats> {
        let run = CollectionRun::start(CollectionType::Historical, symbols.len());
        self.runs.create_run(&run).await?;
        let started = Instant::now();

        let mut stats = RunStats::new(symbols.len());
        let outcome = self
            .collect_historical_inner(symbols, period, force_refresh, &mut stats)
            .await;

        stats.duration = started.elapsed();
        self.runs.finalize_run(&run.id, &stats, Utc::now()).await?;
        outcome?;

        info!("Historical run {}: {}", run.id, stats.summary());
        Ok(stats)
    }

    async fn collect_historical_inner(
        &self,
        symbols: &[String],
        period: HistoryPeriod,
        force_refresh: bool,
        stats: &mut RunStats,
    ) -> Result<()> {
        let mut buffer: Vec<HistoryPoint> = Vec::new();
        let mut buffered_symbols = 0usize;

        for symbol in symbols {
            if !force_refresh {
                if let Some(latest) = self.history.latest_history_date(symbol)? {
                    let age = Utc::now()
                        .date_naive()
                        .signed_duration_since(latest)
                        .num_days();
                    if age <= RECENT_HISTORY_DAYS {
                        debug!("Skipping {}: history current through {}", symbol, latest);
                        stats.record_success();
                        continue;
                    }
                }
            }

            if force_refresh {
                let removed = self.history.delete_history(symbol).await?;
                if removed > 0 {
                    debug!("Cleared {} history rows for {}", removed, symbol);
                }
            }

            match self.provider.get_historical(symbol, period).await {
                Ok(series) => {
                    let now = Utc::now();
                    buffer.extend(
                        series
                            .bars
                            .iter()
                            .map(|bar| HistoryPoint::from_bar(symbol, bar, now)),
                    );
                    buffered_symbols += 1;
                    stats.record_success();

                    if buffered_symbols >= HISTORY_COMMIT_CHUNK {
                        self.flush_history(&mut buffer).await?;
                        buffered_symbols = 0;
                    }
                }
                Err(e) => {
                    warn!("History fetch failed for {}: {}", symbol, e);
                    stats.record_failure(symbol, &e.to_string());
                }
            }
        }

        self.flush_history(&mut buffer).await?;
        Ok(())
    }

    async fn flush_history(&self, buffer: &mut Vec<HistoryPoint>) -> Result<usize> {
        if buffer.is_empty() {
            return Ok(0);
        }
        let inserted = self.history.insert_history(buffer).await?;
        debug!("Committed {} history rows ({} new)", buffer.len(), inserted);
        buffer.clear();
        Ok(inserted)
    }
}
