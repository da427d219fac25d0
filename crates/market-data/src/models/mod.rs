//! Market data models
//!
//! This module contains the core data types for provider operations:
//! - `quote` - Live quote data (Quote)
//! - `history` - Daily bars and period selection (HistoryBar, HistoricalSeries, HistoryPeriod)

mod history;
mod quote;

pub use history::{HistoricalSeries, HistoryBar, HistoryPeriod};
pub use quote::Quote;
