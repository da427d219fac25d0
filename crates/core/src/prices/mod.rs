//! Price collection and caching module.
//!
//! This module provides the services that keep StockPulse's price data
//! current and complete:
//!
//! - [`model`] - Domain models for snapshots, history points, and run stats
//! - [`store`] - Storage traits for persisting and querying price data
//! - [`validator`] - Quote sanity checks applied before anything is stored
//! - [`cache`] - Staleness-aware current price cache
//! - [`collector`] - Batched current and historical collection
//! - [`tiering`] - Mention-driven split between proactive and on-demand symbols
//! - [`backfill`] - Resumable historical backfill with per-symbol progress
//! - [`gapfill`] - Forward-fill for calendar gaps in stored history
//!
//! # Architecture
//!
//! ```text
//! TierService ─┬─> CollectorService ──> QuoteProvider (market-data crate)
//!              └─> PriceCacheService ──────┘   ↓
//! BackfillService / GapFillService ──> PriceStore / HistoryStore (DB)
//! ```
//!
//! Services talk to storage only through the traits in [`store`], so the
//! SQLite implementation and the test mocks are interchangeable.

pub mod backfill;
pub mod cache;
pub mod collector;
pub mod gapfill;
pub mod model;
pub mod store;
pub mod tiering;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types for convenience
pub use model::{
    BackfillProgress, BackfillStatus, CollectionRun, CollectionType, GapFillSummary, HistoryPoint,
    PriceSnapshot, RunStats,
};
pub use store::{BackfillStore, CollectionRunStore, HistoryStore, MentionStore, PriceStore};

// Re-export services
pub use backfill::{BackfillParams, BackfillService};
pub use cache::PriceCacheService;
pub use collector::CollectorService;
pub use gapfill::GapFillService;
pub use tiering::TierService;

// Re-export validation helpers
pub use validator::{price_is_valid, quote_is_valid};
