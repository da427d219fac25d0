//! Database models for current prices and daily history.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use stockpulse_core::prices::{HistoryPoint, PriceSnapshot};

/// Database model for the current price of one symbol.
///
/// Decimals and timestamps are stored as text: decimals in their display
/// form, timestamps as RFC 3339. Both forms compare correctly as strings
/// for the queries this crate runs.
#[derive(
    Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::stock_price)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockPriceDB {
    pub symbol: String,
    pub price: String,
    pub previous_close: Option<String>,
    pub change: Option<String>,
    pub change_percent: Option<String>,
    pub market_state: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub updated_at: String,
}

/// Database model for one stored history row.
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::stock_price_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockPriceHistoryDB {
    pub id: i32,
    pub symbol: String,
    pub date: String,
    pub close_price: String,
    pub volume: Option<i64>,
    pub created_at: String,
}

/// Insert payload for history rows; the id is assigned by SQLite.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::stock_price_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewStockPriceHistoryDB {
    pub symbol: String,
    pub date: String,
    pub close_price: String,
    pub volume: Option<i64>,
    pub created_at: String,
}

// Conversion implementations

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_decimal_opt(s: Option<&str>) -> Option<Decimal> {
    s.and_then(|v| Decimal::from_str(v).ok())
}

impl From<StockPriceDB> for PriceSnapshot {
    fn from(db: StockPriceDB) -> Self {
        PriceSnapshot {
            symbol: db.symbol,
            price: Decimal::from_str(&db.price).unwrap_or_default(),
            previous_close: parse_decimal_opt(db.previous_close.as_deref()),
            change: parse_decimal_opt(db.change.as_deref()),
            change_percent: parse_decimal_opt(db.change_percent.as_deref()),
            market_state: db.market_state,
            currency: db.currency,
            exchange: db.exchange,
            updated_at: parse_datetime(&db.updated_at),
        }
    }
}

impl From<&PriceSnapshot> for StockPriceDB {
    fn from(snapshot: &PriceSnapshot) -> Self {
        StockPriceDB {
            symbol: snapshot.symbol.clone(),
            price: snapshot.price.to_string(),
            previous_close: snapshot.previous_close.map(|d| d.to_string()),
            change: snapshot.change.map(|d| d.to_string()),
            change_percent: snapshot.change_percent.map(|d| d.to_string()),
            market_state: snapshot.market_state.clone(),
            currency: snapshot.currency.clone(),
            exchange: snapshot.exchange.clone(),
            updated_at: snapshot.updated_at.to_rfc3339(),
        }
    }
}

impl From<StockPriceHistoryDB> for HistoryPoint {
    fn from(db: StockPriceHistoryDB) -> Self {
        HistoryPoint {
            symbol: db.symbol,
            date: NaiveDate::parse_from_str(&db.date, "%Y-%m-%d").unwrap_or_default(),
            close_price: Decimal::from_str(&db.close_price).unwrap_or_default(),
            volume: db.volume,
            created_at: parse_datetime(&db.created_at),
        }
    }
}

impl From<&HistoryPoint> for NewStockPriceHistoryDB {
    fn from(point: &HistoryPoint) -> Self {
        NewStockPriceHistoryDB {
            symbol: point.symbol.clone(),
            date: point.date.format("%Y-%m-%d").to_string(),
            close_price: point.close_price.to_string(),
            volume: point.volume,
            created_at: point.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_conversion_round_trip() {
        let snapshot = PriceSnapshot {
            symbol: "AAPL".to_string(),
            price: dec!(150.25),
            previous_close: Some(dec!(149.10)),
            change: Some(dec!(1.15)),
            change_percent: None,
            market_state: Some("REGULAR".to_string()),
            currency: Some("USD".to_string()),
            exchange: Some("NasdaqGS".to_string()),
            updated_at: Utc::now(),
        };

        let db = StockPriceDB::from(&snapshot);
        assert_eq!(db.price, "150.25");
        assert_eq!(db.change_percent, None);

        let back = PriceSnapshot::from(db);
        assert_eq!(back.symbol, snapshot.symbol);
        assert_eq!(back.price, snapshot.price);
        assert_eq!(back.previous_close, snapshot.previous_close);
        assert_eq!(back.market_state, snapshot.market_state);
        assert!((snapshot.updated_at - back.updated_at).num_seconds().abs() < 1);
    }

    #[test]
    fn test_history_conversion_round_trip() {
        let point = HistoryPoint {
            symbol: "MSFT".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            close_price: dec!(370.87),
            volume: Some(25_258_600),
            created_at: Utc::now(),
        };

        let db = NewStockPriceHistoryDB::from(&point);
        assert_eq!(db.date, "2024-01-02");
        assert_eq!(db.close_price, "370.87");

        let stored = StockPriceHistoryDB {
            id: 1,
            symbol: db.symbol,
            date: db.date,
            close_price: db.close_price,
            volume: db.volume,
            created_at: db.created_at,
        };
        let back = HistoryPoint::from(stored);
        assert_eq!(back.date, point.date);
        assert_eq!(back.close_price, point.close_price);
        assert_eq!(back.volume, point.volume);
    }

    #[test]
    fn test_unparseable_price_falls_back_to_zero() {
        let db = StockPriceDB {
            symbol: "BAD".to_string(),
            price: "not a number".to_string(),
            previous_close: Some("also bad".to_string()),
            change: None,
            change_percent: None,
            market_state: None,
            currency: None,
            exchange: None,
            updated_at: "garbage".to_string(),
        };

        let snapshot = PriceSnapshot::from(db);
        assert_eq!(snapshot.price, Decimal::ZERO);
        assert_eq!(snapshot.previous_close, None);
    }
}
