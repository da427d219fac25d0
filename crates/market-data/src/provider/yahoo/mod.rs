//! Yahoo Finance market data provider.
//!
//! Current prices come from the v7 quote endpoint, which accepts many
//! symbols per request. Daily history comes from the v8 chart endpoint,
//! one symbol per request.

mod models;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::FetchError;
use crate::models::{HistoricalSeries, HistoryBar, HistoryPeriod, Quote};
use crate::provider::QuoteProvider;
use crate::rate_limiter::RateLimiter;

use models::{ChartEnvelope, ChartResult, QuoteEnvelope, QuoteRow};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER_ID: &str = "YAHOO";

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance quote provider.
///
/// All requests pass through a token-bucket rate limiter before they
/// reach the network, so callers never need to pace themselves.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    limiter: RateLimiter,
}

impl YahooProvider {
    /// Create a provider pointed at the public Yahoo Finance API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a provider against an alternate base URL.
    ///
    /// Used by tests to point the provider at a local mock server.
    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(Default::default()),
        }
    }

    /// Make a rate-limited GET request and return the response body.
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.limiter.acquire(PROVIDER_ID).await;

        debug!("Yahoo request: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                FetchError::Network(e)
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(FetchError::Network)
    }

    /// Convert one v7 quote row into a live quote.
    ///
    /// Returns `None` when the row carries no usable market price, which
    /// Yahoo does for halted and delisted symbols. NaN and infinite
    /// values also drop out here: `from_f64` has no representation for
    /// them.
    fn quote_from_row(row: &QuoteRow) -> Option<Quote> {
        let price = row.regular_market_price.and_then(Decimal::from_f64)?;

        Some(Quote {
            price,
            previous_close: row
                .regular_market_previous_close
                .and_then(Decimal::from_f64),
            change: row.regular_market_change.and_then(Decimal::from_f64),
            change_percent: row
                .regular_market_change_percent
                .and_then(Decimal::from_f64),
            market_state: row.market_state.clone(),
            currency: row.currency.clone(),
            exchange: row
                .full_exchange_name
                .clone()
                .or_else(|| row.exchange.clone()),
        })
    }

    /// Convert a v8 chart result into daily bars, ascending by date.
    ///
    /// Null closes are skipped. When several timestamps land on the same
    /// calendar date (the daily bar plus the live intraday snapshot),
    /// the later entry wins.
    fn bars_from_chart(result: &ChartResult) -> Vec<HistoryBar> {
        let Some(block) = result.indicators.quote.first() else {
            return Vec::new();
        };

        let mut by_date = BTreeMap::new();
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Some(close) = block.close.get(i).copied().flatten() else {
                continue;
            };
            let Some(close) = Decimal::from_f64(close) else {
                warn!("Skipping bar at index {}: unrepresentable close {}", i, close);
                continue;
            };
            let Some(date) = Utc.timestamp_opt(*ts, 0).single().map(|dt| dt.date_naive())
            else {
                warn!("Skipping bar at index {}: invalid timestamp {}", i, ts);
                continue;
            };

            let volume = block.volume.get(i).copied().flatten();
            by_date.insert(date, HistoryBar { date, close, volume });
        }

        by_date.into_values().collect()
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// QuoteProvider implementation
// ============================================================================

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_price(&self, symbol: &str) -> Result<Option<Quote>, FetchError> {
        let mut quotes = self.get_multiple_prices(&[symbol.to_string()]).await?;
        Ok(quotes.remove(symbol).flatten())
    }

    async fn get_multiple_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Option<Quote>>, FetchError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = symbols.join(",");
        let url = format!(
            "{}/v7/finance/quote?symbols={}",
            self.base_url,
            encode(&joined)
        );

        let text = self.fetch(&url).await?;
        let envelope: QuoteEnvelope =
            serde_json::from_str(&text).map_err(|e| FetchError::Parse {
                message: format!("quote response: {}", e),
            })?;

        if let Some(error) = envelope.quote_response.error {
            return Err(FetchError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: error
                    .description
                    .or(error.code)
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        // Every requested symbol gets an entry; rows Yahoo omitted stay None.
        let mut quotes: HashMap<String, Option<Quote>> =
            symbols.iter().map(|s| (s.clone(), None)).collect();

        for row in &envelope.quote_response.result {
            if let Some(entry) = quotes.get_mut(&row.symbol) {
                *entry = Self::quote_from_row(row);
            }
        }

        Ok(quotes)
    }

    async fn get_historical(
        &self,
        symbol: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalSeries, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            encode(symbol),
            period.as_str()
        );

        let text = self.fetch(&url).await?;
        let envelope: ChartEnvelope =
            serde_json::from_str(&text).map_err(|e| FetchError::Parse {
                message: format!("chart response: {}", e),
            })?;

        if let Some(error) = envelope.chart.error {
            if error.code.as_deref() == Some("Not Found") {
                return Err(FetchError::SymbolNotFound(symbol.to_string()));
            }
            return Err(FetchError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: error
                    .description
                    .or(error.code)
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let result = envelope
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;

        let bars = Self::bars_from_chart(&result);
        debug!(
            "Yahoo chart for {}: {} bars over {}",
            symbol,
            bars.len(),
            period
        );

        Ok(HistoricalSeries {
            symbol: symbol.to_string(),
            currency: result.meta.currency.clone(),
            period,
            bars,
        })
    }
}
