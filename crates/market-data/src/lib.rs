//! StockPulse Market Data Crate
//!
//! Provider-facing layer of the price collection pipeline. Everything
//! upstream of storage lives here: the wire models, the provider trait,
//! the Yahoo Finance implementation, and the rate limiter that paces it.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Live quotes, fetched one symbol at a time or in multi-symbol batches
//! - Daily price history over a named lookback period
//! - Token-bucket rate limiting shared across all calls to a provider
//!
//! # Core Types
//!
//! - [`Quote`] - A live market price with its change context
//! - [`HistoricalSeries`] - Daily close bars for one symbol
//! - [`HistoryPeriod`] - Named lookback window ("1mo" through "max")
//! - [`QuoteProvider`] - The trait every data source implements
//! - [`FetchError`] - Provider failures, each tagged with a [`RetryClass`]

pub mod errors;
pub mod models;
pub mod provider;
pub mod rate_limiter;

// Re-export all public types from models
pub use models::{HistoricalSeries, HistoryBar, HistoryPeriod, Quote};

// Re-export error types
pub use errors::{FetchError, RetryClass};

// Re-export provider types
pub use provider::yahoo::YahooProvider;
pub use provider::QuoteProvider;

// Re-export rate limiter types
pub use rate_limiter::{RateLimitConfig, RateLimiter};
