use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use std::sync::Arc;

use super::model::{MentionCountRow, NewSymbolMentionDB, WatchlistEntryDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::watchlist::dsl as watchlist_dsl;
use stockpulse_core::prices::MentionStore;
use stockpulse_core::Result;

/// SQLite-backed implementation of [`MentionStore`].
///
/// Mention rows are written by the article ingestion pipeline; this
/// repository also exposes write helpers so tooling and tests can record
/// mentions and manage the watchlist directly.
pub struct MentionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MentionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Record one mention of a symbol.
    pub async fn record_mention(
        &self,
        symbol: &str,
        source: Option<&str>,
        mentioned_at: DateTime<Utc>,
    ) -> Result<()> {
        let row = NewSymbolMentionDB {
            symbol: symbol.to_string(),
            source: source.map(|s| s.to_string()),
            mentioned_at: mentioned_at.to_rfc3339(),
            created_at: Utc::now().to_rfc3339(),
        };

        self.writer
            .exec(move |conn| -> Result<()> {
                diesel::insert_into(crate::schema::symbol_mentions::dsl::symbol_mentions)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    /// Put a symbol on the tracked list. Adding an existing symbol is a
    /// no-op.
    pub async fn add_to_watchlist(&self, symbol: &str) -> Result<()> {
        let row = WatchlistEntryDB {
            symbol: symbol.to_string(),
            added_at: Utc::now().to_rfc3339(),
        };

        self.writer
            .exec(move |conn| -> Result<()> {
                diesel::insert_or_ignore_into(watchlist_dsl::watchlist)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }
}

// =============================================================================
// MentionStore Implementation
// =============================================================================

impl MentionStore for MentionRepository {
    fn top_mentioned(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<(String, i64)>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = sql_query(
            "SELECT symbol, COUNT(*) AS mention_count \
             FROM symbol_mentions \
             WHERE mentioned_at >= ? \
             GROUP BY symbol \
             ORDER BY mention_count DESC, symbol ASC \
             LIMIT ?",
        )
        .bind::<Text, _>(since.to_rfc3339())
        .bind::<BigInt, _>(limit as i64)
        .load::<MentionCountRow>(&mut conn)
        .into_core()?;

        Ok(rows
            .into_iter()
            .map(|row| (row.symbol, row.mention_count))
            .collect())
    }

    fn symbols_with_mentions(&self, min_count: i64) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = sql_query(
            "SELECT symbol, COUNT(*) AS mention_count \
             FROM symbol_mentions \
             GROUP BY symbol \
             HAVING COUNT(*) >= ? \
             ORDER BY symbol ASC",
        )
        .bind::<BigInt, _>(min_count)
        .load::<MentionCountRow>(&mut conn)
        .into_core()?;

        Ok(rows.into_iter().map(|row| row.symbol).collect())
    }

    fn tracked_symbols(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        watchlist_dsl::watchlist
            .order(watchlist_dsl::symbol.asc())
            .select(watchlist_dsl::symbol)
            .load::<String>(&mut conn)
            .into_core()
    }
}

// ============================================================================
// Tests
// ============================================================================
