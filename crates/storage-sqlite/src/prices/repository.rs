use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::model::{NewStockPriceHistoryDB, StockPriceDB, StockPriceHistoryDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::stock_price::dsl as stock_price_dsl;
use crate::schema::stock_price_history::dsl as history_dsl;
use crate::utils::chunk_for_sqlite;
use stockpulse_core::prices::{HistoryPoint, HistoryStore, PriceSnapshot, PriceStore};
use stockpulse_core::Result;

/// SQLite-backed implementation of [`PriceStore`] and [`HistoryStore`].
pub struct PriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

// =============================================================================
// PriceStore Implementation
// =============================================================================

#[async_trait]
impl PriceStore for PriceRepository {
    fn get_snapshot(&self, symbol: &str) -> Result<Option<PriceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let row = stock_price_dsl::stock_price
            .filter(stock_price_dsl::symbol.eq(symbol))
            .first::<StockPriceDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(PriceSnapshot::from))
    }

    fn get_snapshots(&self, symbols: &[String]) -> Result<HashMap<String, PriceSnapshot>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = get_connection(&self.pool)?;
        let mut result = HashMap::new();

        for chunk in chunk_for_sqlite(symbols) {
            let rows = stock_price_dsl::stock_price
                .filter(stock_price_dsl::symbol.eq_any(chunk))
                .load::<StockPriceDB>(&mut conn)
                .into_core()?;

            for row in rows {
                result.insert(row.symbol.clone(), PriceSnapshot::from(row));
            }
        }

        Ok(result)
    }

    async fn upsert_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        let db_row = StockPriceDB::from(snapshot);

        self.writer
            .exec(move |conn| -> Result<()> {
                diesel::replace_into(stock_price_dsl::stock_price)
                    .values(&db_row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    async fn upsert_snapshots(&self, snapshots: &[PriceSnapshot]) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<StockPriceDB> = snapshots.iter().map(StockPriceDB::from).collect();

        self.writer
            .exec(move |conn| -> Result<usize> {
                let mut total = 0;
                for chunk in db_rows.chunks(1_000) {
                    total += diesel::replace_into(stock_price_dsl::stock_price)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                Ok(total)
            })
            .await
    }
}

// =============================================================================
// HistoryStore Implementation
// =============================================================================

#[async_trait]
impl HistoryStore for PriceRepository {
    fn latest_history_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let latest = history_dsl::stock_price_history
            .filter(history_dsl::symbol.eq(symbol))
            .select(diesel::dsl::max(history_dsl::date))
            .first::<Option<String>>(&mut conn)
            .into_core()?;

        Ok(latest.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
    }

    fn history_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryPoint>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = history_dsl::stock_price_history
            .filter(history_dsl::symbol.eq(symbol))
            .filter(history_dsl::date.ge(start.format("%Y-%m-%d").to_string()))
            .filter(history_dsl::date.le(end.format("%Y-%m-%d").to_string()))
            .order(history_dsl::date.asc())
            .load::<StockPriceHistoryDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(HistoryPoint::from).collect())
    }

    fn history_dates(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        let dates = history_dsl::stock_price_history
            .filter(history_dsl::symbol.eq(symbol))
            .filter(history_dsl::date.ge(start.format("%Y-%m-%d").to_string()))
            .filter(history_dsl::date.le(end.format("%Y-%m-%d").to_string()))
            .order(history_dsl::date.asc())
            .select(history_dsl::date)
            .load::<String>(&mut conn)
            .into_core()?;

        Ok(dates
            .into_iter()
            .filter_map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .collect())
    }

    fn latest_close_before(&self, symbol: &str, date: NaiveDate) -> Result<Option<Decimal>> {
        let mut conn = get_connection(&self.pool)?;

        let close = history_dsl::stock_price_history
            .filter(history_dsl::symbol.eq(symbol))
            .filter(history_dsl::date.lt(date.format("%Y-%m-%d").to_string()))
            .order(history_dsl::date.desc())
            .select(history_dsl::close_price)
            .first::<String>(&mut conn)
            .optional()
            .into_core()?;

        Ok(close.and_then(|s| Decimal::from_str(&s).ok()))
    }

    async fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<NewStockPriceHistoryDB> =
            points.iter().map(NewStockPriceHistoryDB::from).collect();

        self.writer
            .exec(move |conn| -> Result<usize> {
                let mut inserted = 0;
                for chunk in db_rows.chunks(1_000) {
                    // INSERT OR IGNORE, so rows for already-stored dates
                    // drop out and do not count
                    inserted += diesel::insert_or_ignore_into(history_dsl::stock_price_history)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                Ok(inserted)
            })
            .await
    }

    async fn delete_history(&self, symbol: &str) -> Result<usize> {
        let symbol = symbol.to_string();

        self.writer
            .exec(move |conn| -> Result<usize> {
                let removed = diesel::delete(
                    history_dsl::stock_price_history.filter(history_dsl::symbol.eq(symbol)),
                )
                .execute(conn)
                .map_err(StorageError::QueryFailed)?;
                Ok(removed)
            })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
