//! Forward-fill for holes in stored daily history.
//!
//! Markets close on weekends and holidays, and providers occasionally
//! drop a day, so stored history has calendar gaps. Analyses that join
//! prices by date want one row per day, so the gap filler walks a date
//! window and writes the most recent prior close into every missing day.
//!
//! A day with no earlier close on record is left empty. Filling never
//! fabricates a price, it only carries a real one forward. Filled rows
//! carry zero volume so they stay distinguishable from traded days.

use chrono::{NaiveDate, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::model::{CollectionRun, CollectionType, GapFillSummary, HistoryPoint, RunStats};
use super::store::{CollectionRunStore, HistoryStore};
use crate::errors::{Error, Result};

/// Fills calendar gaps in stored history.
pub struct GapFillService<H, R>
where
    H: HistoryStore,
    R: CollectionRunStore,
{
    history: Arc<H>,
    runs: Arc<R>,
}

impl<H, R> GapFillService<H, R>
where
    H: HistoryStore + 'static,
    R: CollectionRunStore + 'static,
{
    pub fn new(history: Arc<H>, runs: Arc<R>) -> Self {
        Self { history, runs }
    }

    /// Forward-fill missing dates for every symbol across the window,
    /// both ends inclusive.
    ///
    /// Running the same window twice is harmless: the second pass finds
    /// no missing dates and writes nothing.
    pub async fn fill_gaps(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GapFillSummary> {
        if end < start {
            return Err(Error::InvalidConfigValue(format!(
                "gap fill window ends {} before it starts {}",
                end, start
            )));
        }

        let run = CollectionRun::start(CollectionType::GapFill, symbols.len());
        self.runs.create_run(&run).await?;
        let started = Instant::now();

        let mut stats = RunStats::new(symbols.len());
        let mut summary = GapFillSummary::default();
        let outcome = self
            .fill_inner(symbols, start, end, &mut stats, &mut summary)
            .await;

        stats.duration = started.elapsed();
        self.runs.finalize_run(&run.id, &stats, Utc::now()).await?;
        outcome?;

        info!(
            "Gap fill: {} rows added across {} symbols between {} and {}",
            summary.total_filled, summary.symbols_processed, start, end
        );
        Ok(summary)
    }

    async fn fill_inner(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        stats: &mut RunStats,
        summary: &mut GapFillSummary,
    ) -> Result<()> {
        for symbol in symbols {
            let filled = self.fill_symbol(symbol, start, end).await?;
            summary.symbols_processed += 1;
            summary.total_filled += filled;
            stats.record_success();
        }
        Ok(())
    }

    async fn fill_symbol(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        let existing: BTreeMap<NaiveDate, Decimal> = self
            .history
            .history_range(symbol, start, end)?
            .into_iter()
            .map(|p| (p.date, p.close_price))
            .collect();
        let mut last_close = self.history.latest_close_before(symbol, start)?;

        let now = Utc::now();
        let mut fills = Vec::new();
        for day in start.iter_days().take_while(|d| *d <= end) {
            match existing.get(&day) {
                Some(close) => last_close = Some(*close),
                None => {
                    if let Some(close) = last_close {
                        fills.push(HistoryPoint {
                            symbol: symbol.to_string(),
                            date: day,
                            close_price: close,
                            volume: Some(0),
                            created_at: now,
                        });
                    }
                }
            }
        }

        if fills.is_empty() {
            debug!("No fillable gaps for {} between {} and {}", symbol, start, end);
            return Ok(0);
        }

        let inserted = self.history.insert_history(&fills).await?;
        debug!("Filled {} gap rows for {}", inserted, symbol);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::test_support::{date, point, MockHistoryStore, MockRunStore};
    use rust_decimal_macros::dec;

    struct Fixture {
        history: MockHistoryStore,
        runs: MockRunStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                history: MockHistoryStore::new(),
                runs: MockRunStore::new(),
            }
        }

        fn service(&self) -> GapFillService<MockHistoryStore, MockRunStore> {
            GapFillService::new(Arc::new(self.history.clone()), Arc::new(self.runs.clone()))
        }
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_gapfill_carries_prior_close_forward() {
        let fx = Fixture::new();
        fx.history.seed(point("AAPL", "2024-01-02", dec!(10)));
        fx.history.seed(point("AAPL", "2024-01-05", dec!(12)));

        let summary = fx
            .service()
            .fill_gaps(&symbols(&["AAPL"]), date("2024-01-01"), date("2024-01-07"))
            .await
            .unwrap();

        // 01-01 has no prior close and stays empty; 01-03 and 01-04 get 10;
        // 01-06 and 01-07 get 12
        assert_eq!(summary.total_filled, 4);
        let stored = fx.history.all_for("AAPL");
        assert_eq!(stored.len(), 6);

        let by_date: std::collections::HashMap<_, _> =
            stored.iter().map(|p| (p.date, p.clone())).collect();
        assert!(!by_date.contains_key(&date("2024-01-01")));
        assert_eq!(by_date[&date("2024-01-03")].close_price, dec!(10));
        assert_eq!(by_date[&date("2024-01-03")].volume, Some(0));
        assert_eq!(by_date[&date("2024-01-06")].close_price, dec!(12));
    }

    #[tokio::test]
    async fn test_gapfill_seeds_from_close_before_the_window() {
        let fx = Fixture::new();
        fx.history.seed(point("AAPL", "2023-12-29", dec!(9)));

        let summary = fx
            .service()
            .fill_gaps(&symbols(&["AAPL"]), date("2024-01-01"), date("2024-01-03"))
            .await
            .unwrap();

        assert_eq!(summary.total_filled, 3);
        let stored = fx.history.all_for("AAPL");
        assert_eq!(stored.len(), 4);
        assert!(stored
            .iter()
            .filter(|p| p.date >= date("2024-01-01"))
            .all(|p| p.close_price == dec!(9)));
    }

    #[tokio::test]
    async fn test_gapfill_never_invents_a_price() {
        let fx = Fixture::new();

        let summary = fx
            .service()
            .fill_gaps(&symbols(&["EMPTY"]), date("2024-01-01"), date("2024-01-05"))
            .await
            .unwrap();

        assert_eq!(summary.symbols_processed, 1);
        assert_eq!(summary.total_filled, 0);
        assert_eq!(fx.history.total_points(), 0);
    }

    #[tokio::test]
    async fn test_gapfill_does_not_touch_existing_rows() {
        let fx = Fixture::new();
        fx.history.seed(point("AAPL", "2023-12-29", dec!(9)));
        fx.history.seed(point("AAPL", "2024-01-02", dec!(10)));

        fx.service()
            .fill_gaps(&symbols(&["AAPL"]), date("2024-01-01"), date("2024-01-02"))
            .await
            .unwrap();

        let stored = fx.history.all_for("AAPL");
        let real = stored.iter().find(|p| p.date == date("2024-01-02")).unwrap();
        assert_eq!(real.close_price, dec!(10));
        assert_eq!(real.volume, Some(1_000));
    }

    #[tokio::test]
    async fn test_gapfill_is_idempotent() {
        let fx = Fixture::new();
        fx.history.seed(point("AAPL", "2024-01-02", dec!(10)));
        let service = fx.service();
        let window = (date("2024-01-01"), date("2024-01-10"));

        let first = service
            .fill_gaps(&symbols(&["AAPL"]), window.0, window.1)
            .await
            .unwrap();
        let points_after_first = fx.history.total_points();

        let second = service
            .fill_gaps(&symbols(&["AAPL"]), window.0, window.1)
            .await
            .unwrap();

        assert_eq!(first.total_filled, 8);
        assert_eq!(second.total_filled, 0);
        assert_eq!(fx.history.total_points(), points_after_first);
    }

    #[tokio::test]
    async fn test_gapfill_records_an_audit_run() {
        let fx = Fixture::new();
        fx.history.seed(point("AAPL", "2024-01-02", dec!(10)));

        fx.service()
            .fill_gaps(&symbols(&["AAPL"]), date("2024-01-01"), date("2024-01-05"))
            .await
            .unwrap();

        let created = fx.runs.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].run_type, CollectionType::GapFill);
        assert_eq!(fx.runs.finalized_stats().len(), 1);
    }

    #[tokio::test]
    async fn test_gapfill_rejects_inverted_window() {
        let fx = Fixture::new();

        let result = fx
            .service()
            .fill_gaps(&symbols(&["AAPL"]), date("2024-01-10"), date("2024-01-01"))
            .await;

        assert!(result.is_err());
        assert!(fx.runs.created.lock().unwrap().is_empty());
    }
}
