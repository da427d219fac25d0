//! Symbol tiering.
//!
//! Symbols split into two tiers. The top tier, ranked by recent article
//! mentions, is collected proactively in small batches. Everything else
//! is served on demand straight from the price cache, which only goes
//! out to the provider when its snapshot has gone stale.

use chrono::{Duration, Utc};
use log::{debug, info};
use std::sync::Arc;

use stockpulse_market_data::QuoteProvider;

use super::cache::PriceCacheService;
use super::collector::CollectorService;
use super::model::{PriceSnapshot, RunStats};
use super::store::{CollectionRunStore, HistoryStore, MentionStore, PriceStore};
use crate::constants::TOP_TIER_BATCH_SIZE;
use crate::errors::Result;

/// Routes symbols to proactive collection or on-demand lookup.
pub struct TierService<S, H, R, P, M>
where
    S: PriceStore,
    H: HistoryStore,
    R: CollectionRunStore,
    P: QuoteProvider,
    M: MentionStore,
{
    mentions: Arc<M>,
    collector: CollectorService<S, H, R, P>,
    cache: PriceCacheService<S, P>,
}

impl<S, H, R, P, M> TierService<S, H, R, P, M>
where
    S: PriceStore + 'static,
    H: HistoryStore + 'static,
    R: CollectionRunStore + 'static,
    P: QuoteProvider + 'static,
    M: MentionStore + 'static,
{
    /// Wire up a tier service. Top tier collection runs with its own,
    /// smaller batch size regardless of how the collector was configured.
    pub fn new(
        mentions: Arc<M>,
        collector: CollectorService<S, H, R, P>,
        cache: PriceCacheService<S, P>,
    ) -> Self {
        Self {
            mentions,
            collector: collector.with_batch_size(TOP_TIER_BATCH_SIZE),
            cache,
        }
    }

    /// Rank symbols by mention count inside the trailing window.
    ///
    /// Ties are broken by symbol, ascending, so rankings are stable
    /// across runs against the same data.
    pub fn select_top_n(&self, limit: usize, window_hours: i64) -> Result<Vec<(String, i64)>> {
        let since = Utc::now() - Duration::hours(window_hours);
        let ranked = self.mentions.top_mentioned(since, limit)?;
        debug!(
            "Selected {} of up to {} top tier symbols over the last {}h",
            ranked.len(),
            limit,
            window_hours
        );
        Ok(ranked)
    }

    /// Collect current prices for the top tier.
    pub async fn collect_top_tier(&self, limit: usize, window_hours: i64) -> Result<RunStats> {
        let ranked = self.select_top_n(limit, window_hours)?;
        let symbols: Vec<String> = ranked.into_iter().map(|(symbol, _)| symbol).collect();

        if symbols.is_empty() {
            info!(
                "No symbols mentioned in the last {}h, skipping top tier collection",
                window_hours
            );
            return Ok(RunStats::new(0));
        }

        self.collector.collect_current(&symbols).await
    }

    /// Get a price for a symbol outside the top tier.
    ///
    /// Serves the cached snapshot while it is fresh and refreshes it
    /// otherwise, so rarely requested symbols cost nothing between
    /// requests.
    pub async fn quote_on_demand(&self, symbol: &str) -> Result<Option<PriceSnapshot>> {
        self.cache.get_or_refresh(symbol, false).await
    }
}
