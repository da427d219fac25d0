//! Price collection constants.

/// Age at which a cached price snapshot stops being served, in seconds.
/// A snapshot exactly this old counts as stale.
pub const QUOTE_STALE_AFTER_SECS: i64 = 30 * 60;

/// Upper bound for a believable per-share price.
/// Anything above this is treated as corrupt provider data.
pub const MAX_REASONABLE_PRICE: i64 = 1_000_000;

/// Symbols per multi-symbol quote request during a collection run.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Pause between quote batches, in seconds.
pub const BATCH_PAUSE_SECS: f64 = 1.0;

/// Symbols per batch when refreshing the top mention tier.
/// Smaller than the general batch size so a tier refresh stays quick.
pub const TOP_TIER_BATCH_SIZE: usize = 5;

/// Default lookback window for mention ranking, in hours.
pub const DEFAULT_MENTION_WINDOW_HOURS: i64 = 24;

/// A symbol whose newest history row is at most this many days old is
/// considered covered, and an unforced historical collection skips it.
pub const RECENT_HISTORY_DAYS: i64 = 7;

/// Number of symbols whose history is buffered before one storage write.
pub const HISTORY_COMMIT_CHUNK: usize = 5;

/// Cap on per-symbol error messages kept in run statistics.
/// Counters keep counting past the cap; only the messages stop.
pub const MAX_RUN_ERRORS: usize = 100;

/// Attempts per symbol during backfill before it is marked failed.
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Default mention count a symbol needs to enter the backfill universe.
pub const DEFAULT_MIN_ARTICLE_MENTIONS: i64 = 10;

/// Default symbols per backfill batch.
pub const DEFAULT_BACKFILL_BATCH: usize = 5;

/// Default pause between backfill batches, in seconds.
pub const DEFAULT_BACKFILL_DELAY_SECS: f64 = 2.0;

/// Default start of the backfill window when none is given.
pub const DEFAULT_BACKFILL_START: &str = "2020-01-01";
