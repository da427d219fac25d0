//! Resumable historical backfill.
//!
//! A backfill run walks a symbol universe and pulls daily history for a
//! date window, recording per-symbol progress under its run id. Rerunning
//! the same run id picks up where the previous attempt stopped: symbols
//! already completed are skipped, symbols that failed or were interrupted
//! mid-flight are retried. History inserts skip dates that already exist,
//! so a retried symbol never doubles its rows.
//!
//! Transient provider errors are retried in place with a doubling delay,
//! a bounded number of attempts per symbol. Anything else fails the
//! symbol immediately and the run moves on.

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use stockpulse_market_data::{
    FetchError, HistoricalSeries, HistoryPeriod, QuoteProvider, RetryClass,
};

use super::model::{
    BackfillProgress, BackfillStatus, CollectionRun, CollectionType, HistoryPoint, RunStats,
};
use super::store::{BackfillStore, CollectionRunStore, HistoryStore, MentionStore};
use crate::constants::{
    DEFAULT_BACKFILL_BATCH, DEFAULT_BACKFILL_DELAY_SECS, DEFAULT_MIN_ARTICLE_MENTIONS,
    MAX_FETCH_ATTEMPTS,
};
use crate::errors::{Error, Result};

/// Parameters for one backfill invocation.
#[derive(Clone, Debug)]
pub struct BackfillParams {
    /// Identifier shared by every invocation of the same logical run.
    pub run_id: String,
    /// First date to backfill, inclusive.
    pub start_date: NaiveDate,
    /// Last date to backfill, inclusive.
    pub end_date: NaiveDate,
    /// Only backfill symbols mentioned at least this many times.
    /// Zero or negative disables the filter.
    pub min_article_threshold: i64,
    /// Symbols processed between pauses.
    pub batch_size: usize,
    /// Pause between batches, and the base for retry backoff, in seconds.
    pub delay_seconds: f64,
    /// Skip symbols already completed under this run id.
    pub resume: bool,
}

impl BackfillParams {
    pub fn new(run_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            run_id: run_id.into(),
            start_date,
            end_date,
            min_article_threshold: DEFAULT_MIN_ARTICLE_MENTIONS,
            batch_size: DEFAULT_BACKFILL_BATCH,
            delay_seconds: DEFAULT_BACKFILL_DELAY_SECS,
            resume: true,
        }
    }
}

/// Drives resumable history backfills.
pub struct BackfillService<H, B, R, M, P>
where
    H: HistoryStore,
    B: BackfillStore,
    R: CollectionRunStore,
    M: MentionStore,
    P: QuoteProvider,
{
    history: Arc<H>,
    backfill: Arc<B>,
    runs: Arc<R>,
    mentions: Arc<M>,
    provider: Arc<P>,
}

impl<H, B, R, M, P> BackfillService<H, B, R, M, P>
where
    H: HistoryStore + 'static,
    B: BackfillStore + 'static,
    R: CollectionRunStore + 'static,
    M: MentionStore + 'static,
    P: QuoteProvider + 'static,
{
    pub fn new(
        history: Arc<H>,
        backfill: Arc<B>,
        runs: Arc<R>,
        mentions: Arc<M>,
        provider: Arc<P>,
    ) -> Self {
        Self {
            history,
            backfill,
            runs,
            mentions,
            provider,
        }
    }

    /// Backfill daily history for every symbol in the universe.
    ///
    /// The universe is the tracked symbol list, narrowed to symbols with
    /// enough article mentions when a threshold is set. With `resume` on,
    /// symbols already completed under this run id are left alone.
    pub async fn run_backfill(&self, params: &BackfillParams) -> Result<RunStats> {
        if params.end_date < params.start_date {
            return Err(Error::InvalidConfigValue(format!(
                "backfill window ends {} before it starts {}",
                params.end_date, params.start_date
            )));
        }

        let universe = self.build_universe(params.min_article_threshold)?;
        let completed = if params.resume {
            self.completed_symbols(&params.run_id)?
        } else {
            HashSet::new()
        };
        let pending: Vec<String> = universe
            .iter()
            .filter(|s| !completed.contains(s.as_str()))
            .cloned()
            .collect();

        info!(
            "Backfill {}: {} symbols in universe, {} already completed, {} to process",
            params.run_id,
            universe.len(),
            completed.len(),
            pending.len()
        );

        let run = CollectionRun::start(CollectionType::Backfill, pending.len());
        self.runs.create_run(&run).await?;
        let started = Instant::now();

        let mut stats = RunStats::new(pending.len());
        let outcome = self.backfill_inner(params, &pending, &mut stats).await;

        stats.duration = started.elapsed();
        self.runs.finalize_run(&run.id, &stats, Utc::now()).await?;
        outcome?;

        info!("Backfill {}: {}", params.run_id, stats.summary());
        Ok(stats)
    }

    fn build_universe(&self, min_article_threshold: i64) -> Result<Vec<String>> {
        let tracked = self.mentions.tracked_symbols()?;
        if min_article_threshold <= 0 {
            return Ok(tracked);
        }
        let mentioned: HashSet<String> = self
            .mentions
            .symbols_with_mentions(min_article_threshold)?
            .into_iter()
            .collect();
        Ok(tracked
            .into_iter()
            .filter(|s| mentioned.contains(s))
            .collect())
    }

    fn completed_symbols(&self, run_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .backfill
            .get_progress(run_id)?
            .into_iter()
            .filter(|p| p.status == BackfillStatus::Completed)
            .map(|p| p.symbol)
            .collect())
    }

    async fn backfill_inner(
        &self,
        params: &BackfillParams,
        symbols: &[String],
        stats: &mut RunStats,
    ) -> Result<()> {
        let period = HistoryPeriod::covering(params.start_date, Utc::now().date_naive());

        for (i, chunk) in symbols.chunks(params.batch_size.max(1)).enumerate() {
            if i > 0 && params.delay_seconds > 0.0 {
                sleep(Duration::from_secs_f64(params.delay_seconds)).await;
            }

            for symbol in chunk {
                let mut progress = BackfillProgress::started(&params.run_id, symbol, Utc::now());
                self.backfill.upsert_progress(&progress).await?;

                match self
                    .fetch_with_backoff(symbol, period, params.delay_seconds)
                    .await
                {
                    Ok(series) => {
                        let now = Utc::now();
                        let points: Vec<HistoryPoint> = series
                            .bars
                            .iter()
                            .filter(|bar| {
                                bar.date >= params.start_date && bar.date <= params.end_date
                            })
                            .map(|bar| HistoryPoint::from_bar(symbol, bar, now))
                            .collect();
                        let inserted = if points.is_empty() {
                            0
                        } else {
                            self.history.insert_history(&points).await?
                        };

                        progress.complete(inserted, Utc::now());
                        self.backfill.upsert_progress(&progress).await?;
                        stats.record_success();
                        debug!(
                            "Backfilled {}: {} of {} bars inserted",
                            symbol,
                            inserted,
                            points.len()
                        );
                    }
                    Err(e) => {
                        progress.fail(&e.to_string(), Utc::now());
                        self.backfill.upsert_progress(&progress).await?;
                        stats.record_failure(symbol, &e.to_string());
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetch history, retrying transient errors with a doubling delay.
    async fn fetch_with_backoff(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        delay_seconds: f64,
    ) -> std::result::Result<HistoricalSeries, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.provider.get_historical(symbol, period).await {
                Ok(series) => return Ok(series),
                Err(e) => {
                    attempt += 1;
                    if e.retry_class() != RetryClass::WithBackoff || attempt >= MAX_FETCH_ATTEMPTS {
                        return Err(e);
                    }
                    let backoff = delay_seconds * f64::from(1u32 << (attempt - 1));
                    warn!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:.1}s",
                        attempt, MAX_FETCH_ATTEMPTS, symbol, e, backoff
                    );
                    if backoff > 0.0 {
                        sleep(Duration::from_secs_f64(backoff)).await;
                    }
                }
            }
        }
    }
}
