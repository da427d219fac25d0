//! Quote provider trait definition.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{HistoricalSeries, HistoryPeriod, Quote};

/// Trait for market data providers.
///
/// Implement this trait to add support for a new data source. Transport
/// failures are errors; a symbol the provider simply does not know, in an
/// otherwise successful response, is `None`.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO". Used for logging and
    /// error attribution.
    fn id(&self) -> &'static str;

    /// Fetch the current quote for a single symbol.
    ///
    /// Returns `Ok(None)` when the provider has no data for the symbol
    /// but the request itself succeeded.
    async fn get_price(&self, symbol: &str) -> Result<Option<Quote>, FetchError>;

    /// Fetch current quotes for several symbols in one request.
    ///
    /// The result contains one entry per requested symbol; symbols the
    /// provider did not return (or returned without a usable price) map
    /// to `None`. Exactly one HTTP request is made per invocation.
    async fn get_multiple_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Option<Quote>>, FetchError>;

    /// Fetch daily historical bars for a symbol over a named period.
    ///
    /// Bars are ordered by date ascending with at most one bar per date.
    async fn get_historical(
        &self,
        symbol: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalSeries, FetchError>;
}
