//! Quote provider abstraction and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all providers implement
//! - The Yahoo Finance implementation
//!
//! Providers are deliberately thin: they translate symbols into HTTP
//! requests and responses into [`Quote`](crate::models::Quote) and
//! [`HistoricalSeries`](crate::models::HistoricalSeries) values. Retry
//! policy, validation, and persistence all live with the callers.

mod traits;

pub mod yahoo;

// Re-exports
pub use traits::QuoteProvider;
