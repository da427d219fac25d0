//! Price cache service.
//!
//! Serves the stored snapshot for a symbol while it is fresh and refreshes
//! it from the provider once it goes stale. A failed or invalid refresh
//! never wipes out data: the previous snapshot keeps being served, and
//! `None` is returned only when there is nothing at all to serve.

use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;

use stockpulse_market_data::QuoteProvider;

use super::model::PriceSnapshot;
use super::store::PriceStore;
use super::validator::quote_is_valid;
use crate::errors::Result;

/// Read-through cache over the price snapshot store.
pub struct PriceCacheService<S, P>
where
    S: PriceStore,
    P: QuoteProvider,
{
    store: Arc<S>,
    provider: Arc<P>,
}

impl<S, P> PriceCacheService<S, P>
where
    S: PriceStore + 'static,
    P: QuoteProvider + 'static,
{
    /// Create a new price cache service.
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self { store, provider }
    }

    /// Get the current price for a symbol, refreshing it when needed.
    ///
    /// A fresh snapshot is returned as-is with no provider call. A stale
    /// or missing one triggers a fetch; `force_refresh` triggers one
    /// regardless of age. When the fetch fails or returns an unusable
    /// quote, the previous snapshot is returned unchanged.
    pub async fn get_or_refresh(
        &self,
        symbol: &str,
        force_refresh: bool,
    ) -> Result<Option<PriceSnapshot>> {
        let cached = self.store.get_snapshot(symbol)?;

        let now = Utc::now();
        let needs_fetch = force_refresh || cached.as_ref().map_or(true, |s| s.is_stale_at(now));

        if !needs_fetch {
            debug!("Serving cached price for {}", symbol);
            return Ok(cached);
        }

        match self.provider.get_price(symbol).await {
            Ok(fetched) => match fetched.filter(|q| quote_is_valid(Some(q))) {
                Some(quote) => {
                    let snapshot = PriceSnapshot::from_quote(symbol, &quote, Utc::now());
                    self.store.upsert_snapshot(&snapshot).await?;
                    debug!("Refreshed price for {}: {}", symbol, snapshot.price);
                    Ok(Some(snapshot))
                }
                None => {
                    debug!(
                        "No valid quote returned for {}; keeping previous snapshot",
                        symbol
                    );
                    Ok(cached)
                }
            },
            Err(e) => {
                warn!(
                    "Price fetch failed for {}: {}; keeping previous snapshot",
                    symbol, e
                );
                Ok(cached)
            }
        }
    }
}
