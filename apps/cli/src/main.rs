//! StockPulse CLI - quote collection, backfill, and gap fill commands.
//!
//! Commands:
//! - `collect` - refresh current quotes for the given symbols
//! - `top` - rank symbols by recent mentions, optionally refreshing their quotes
//! - `quote` - fetch one symbol through the price cache
//! - `history` - collect daily close history over a named period
//! - `backfill` - resumable historical backfill across the tracked universe
//! - `gapfill` - forward-fill non-trading days from the last known close
//! - `watch` - manage the tracked symbol list

mod config;

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use config::Config;
use stockpulse_core::constants::{
    DEFAULT_BACKFILL_BATCH, DEFAULT_BACKFILL_DELAY_SECS, DEFAULT_BACKFILL_START,
    DEFAULT_BATCH_SIZE, DEFAULT_MENTION_WINDOW_HOURS, DEFAULT_MIN_ARTICLE_MENTIONS,
};
use stockpulse_core::prices::{
    BackfillParams, BackfillService, CollectorService, GapFillService, MentionStore,
    PriceCacheService, PriceSnapshot, RunStats, TierService,
};
use stockpulse_market_data::{HistoryPeriod, YahooProvider};
use stockpulse_storage_sqlite::db;
use stockpulse_storage_sqlite::{MentionRepository, PriceRepository, RunRepository};

#[derive(Parser)]
#[command(
    name = "stockpulse",
    about = "StockPulse CLI - market quote collection and history backfill"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh current quotes for the given symbols.
    Collect {
        /// Symbols to collect (e.g., AAPL MSFT TSLA).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Symbols per provider request.
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Rank symbols by recent mentions, optionally refreshing their quotes.
    Top {
        /// How many symbols to rank.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Trailing mention window in hours.
        #[arg(long, default_value_t = DEFAULT_MENTION_WINDOW_HOURS)]
        window_hours: i64,

        /// Also refresh quotes for the ranked set.
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Fetch one symbol through the price cache.
    Quote {
        symbol: String,
    },
    /// Collect daily close history over a named period.
    History {
        /// Symbols to collect.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y, max.
        #[arg(long, default_value = "1y")]
        period: String,

        /// Re-fetch symbols whose stored history is already recent.
        #[arg(long, default_value_t = false)]
        force_refresh: bool,
    },
    /// Run a resumable historical backfill across the tracked universe.
    Backfill {
        /// Run identifier for checkpointing. Generated when omitted.
        #[arg(long)]
        run_id: Option<String>,

        /// Window start (YYYY-MM-DD).
        #[arg(long, default_value = DEFAULT_BACKFILL_START)]
        start_date: String,

        /// Window end (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end_date: Option<String>,

        /// Minimum recent mentions for a symbol to be included. 0 disables the filter.
        #[arg(long, default_value_t = DEFAULT_MIN_ARTICLE_MENTIONS)]
        min_articles: i64,

        /// Symbols per batch.
        #[arg(long, default_value_t = DEFAULT_BACKFILL_BATCH)]
        batch_size: usize,

        /// Pause between batches, in seconds.
        #[arg(long, default_value_t = DEFAULT_BACKFILL_DELAY_SECS)]
        delay: f64,

        /// Reprocess symbols already completed under this run id.
        #[arg(long, default_value_t = false)]
        no_resume: bool,
    },
    /// Forward-fill non-trading days from the last known close.
    Gapfill {
        /// Symbols to fill.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Window start (YYYY-MM-DD). Defaults to 30 days before the end.
        #[arg(long)]
        start_date: Option<String>,

        /// Window end (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end_date: Option<String>,
    },
    /// Watchlist management commands.
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },
}

#[derive(Subcommand)]
enum WatchAction {
    /// Add symbols to the watchlist.
    Add {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Print the watchlist.
    List,
}

/// Shared handles every command builds its services from.
struct Deps {
    prices: Arc<PriceRepository>,
    runs: Arc<RunRepository>,
    mentions: Arc<MentionRepository>,
    provider: Arc<YahooProvider>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();
    let config = Config::from_env();
    let deps = build_deps(&config)?;

    match cli.command {
        Commands::Collect {
            symbols,
            batch_size,
        } => run_collect(&deps, symbols, batch_size).await,
        Commands::Top {
            limit,
            window_hours,
            refresh,
        } => run_top(&deps, limit, window_hours, refresh).await,
        Commands::Quote { symbol } => run_quote(&deps, symbol).await,
        Commands::History {
            symbols,
            period,
            force_refresh,
        } => run_history(&deps, symbols, period, force_refresh).await,
        Commands::Backfill {
            run_id,
            start_date,
            end_date,
            min_articles,
            batch_size,
            delay,
            no_resume,
        } => {
            run_backfill_cmd(
                &deps, run_id, start_date, end_date, min_articles, batch_size, delay, no_resume,
            )
            .await
        }
        Commands::Gapfill {
            symbols,
            start_date,
            end_date,
        } => run_gapfill(&deps, symbols, start_date, end_date).await,
        Commands::Watch { action } => run_watch(&deps, action).await,
    }
}

fn init_tracing() {
    let log_format = std::env::var("STOCKPULSE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    // The CLI prints its own summaries; logs default to warnings only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn build_deps(config: &Config) -> Result<Deps> {
    let pool = db::init(&config.db_path)?;
    tracing::debug!("Database in use: {}", config.db_path);
    let writer = db::spawn_writer((*pool).clone());

    Ok(Deps {
        prices: Arc::new(PriceRepository::new(pool.clone(), writer.clone())),
        runs: Arc::new(RunRepository::new(pool.clone(), writer.clone())),
        mentions: Arc::new(MentionRepository::new(pool, writer)),
        provider: Arc::new(YahooProvider::new()),
    })
}

fn build_collector(
    deps: &Deps,
) -> CollectorService<PriceRepository, PriceRepository, RunRepository, YahooProvider> {
    CollectorService::new(
        deps.prices.clone(),
        deps.prices.clone(),
        deps.runs.clone(),
        deps.provider.clone(),
    )
}

fn build_tiering(
    deps: &Deps,
) -> TierService<PriceRepository, PriceRepository, RunRepository, YahooProvider, MentionRepository>
{
    TierService::new(
        deps.mentions.clone(),
        build_collector(deps),
        PriceCacheService::new(deps.prices.clone(), deps.provider.clone()),
    )
}

async fn run_collect(deps: &Deps, symbols: Vec<String>, batch_size: usize) -> Result<()> {
    let collector = build_collector(deps).with_batch_size(batch_size);
    let stats = collector.collect_current(&symbols).await?;
    print_stats("Quote Collection", &stats);
    Ok(())
}

async fn run_top(deps: &Deps, limit: usize, window_hours: i64, refresh: bool) -> Result<()> {
    let tiering = build_tiering(deps);

    let ranked = tiering.select_top_n(limit, window_hours)?;
    if ranked.is_empty() {
        println!("No symbols mentioned in the last {window_hours}h.");
        return Ok(());
    }

    println!("{:<8} {:>8}", "Symbol", "Mentions");
    for (symbol, count) in &ranked {
        println!("{:<8} {:>8}", symbol, count);
    }

    if refresh {
        let stats = tiering.collect_top_tier(limit, window_hours).await?;
        print_stats("Top Tier Refresh", &stats);
    }

    Ok(())
}

async fn run_quote(deps: &Deps, symbol: String) -> Result<()> {
    let tiering = build_tiering(deps);

    match tiering.quote_on_demand(&symbol).await? {
        Some(snapshot) => {
            print_snapshot(&snapshot);
            Ok(())
        }
        None => bail!("no price available for {symbol}"),
    }
}

async fn run_history(
    deps: &Deps,
    symbols: Vec<String>,
    period: String,
    force_refresh: bool,
) -> Result<()> {
    let period: HistoryPeriod = match period.parse() {
        Ok(p) => p,
        Err(e) => bail!("{e}. Valid: 1mo, 3mo, 6mo, 1y, 2y, 5y, max"),
    };

    let collector = build_collector(deps);
    let stats = collector
        .collect_historical(&symbols, period, force_refresh)
        .await?;
    print_stats("History Collection", &stats);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_backfill_cmd(
    deps: &Deps,
    run_id: Option<String>,
    start_date: String,
    end_date: Option<String>,
    min_articles: i64,
    batch_size: usize,
    delay: f64,
    no_resume: bool,
) -> Result<()> {
    let run_id = run_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let start = parse_date(&start_date)?;
    let end = end_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Utc::now().date_naive());

    let params = BackfillParams {
        run_id: run_id.clone(),
        start_date: start,
        end_date: end,
        min_article_threshold: min_articles,
        batch_size,
        delay_seconds: delay,
        resume: !no_resume,
    };

    println!("Backfill run {run_id}: {start} to {end}");
    let backfiller = BackfillService::new(
        deps.prices.clone(),
        deps.runs.clone(),
        deps.runs.clone(),
        deps.mentions.clone(),
        deps.provider.clone(),
    );
    let stats = backfiller.run_backfill(&params).await?;
    print_stats("Backfill", &stats);

    if stats.failed > 0 {
        println!("Retry failed symbols with: stockpulse backfill --run-id {run_id}");
    }
    Ok(())
}

async fn run_gapfill(
    deps: &Deps,
    symbols: Vec<String>,
    start_date: Option<String>,
    end_date: Option<String>,
) -> Result<()> {
    let end = end_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Utc::now().date_naive());
    let start = start_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| end - chrono::Duration::days(30));

    let gap_filler = GapFillService::new(deps.prices.clone(), deps.runs.clone());
    let summary = gap_filler.fill_gaps(&symbols, start, end).await?;

    println!(
        "Filled {} rows across {} symbols between {} and {}",
        summary.total_filled, summary.symbols_processed, start, end
    );
    Ok(())
}

async fn run_watch(deps: &Deps, action: WatchAction) -> Result<()> {
    match action {
        WatchAction::Add { symbols } => {
            for symbol in &symbols {
                deps.mentions.add_to_watchlist(symbol).await?;
            }
            println!("Added {} symbol(s) to the watchlist.", symbols.len());
        }
        WatchAction::List => {
            let tracked = deps.mentions.tracked_symbols()?;
            if tracked.is_empty() {
                println!("Watchlist is empty.");
            }
            for symbol in &tracked {
                println!("{symbol}");
            }
        }
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))
}

fn print_stats(label: &str, stats: &RunStats) {
    println!();
    println!("=== {label} ===");
    println!("Requested: {}", stats.requested);
    println!("Succeeded: {}", stats.success);
    println!("Failed:    {}", stats.failed);
    println!("Duration:  {:.1}s", stats.duration.as_secs_f64());
    if !stats.errors.is_empty() {
        println!();
        println!("--- Failures ---");
        for err in &stats.errors {
            println!("  {err}");
        }
    }
}

fn print_snapshot(s: &PriceSnapshot) {
    println!();
    println!("=== {} ===", s.symbol);
    println!("Price:      {}", s.price);
    if let Some(prev) = s.previous_close {
        println!("Prev close: {prev}");
    }
    if let Some(change) = s.change {
        println!("Change:     {change}");
    }
    if let Some(pct) = s.change_percent {
        println!("Change %:   {pct}");
    }
    if let Some(state) = &s.market_state {
        println!("State:      {state}");
    }
    if let Some(currency) = &s.currency {
        println!("Currency:   {currency}");
    }
    if let Some(exchange) = &s.exchange {
        println!("Exchange:   {exchange}");
    }
    println!("As of:      {}", s.updated_at.to_rfc3339());
}
