//! Database models for article mentions and the tracked symbol list.

use diesel::prelude::*;

/// Database model for one recorded mention.
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::symbol_mentions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SymbolMentionDB {
    pub id: i32,
    pub symbol: String,
    pub source: Option<String>,
    pub mentioned_at: String,
    pub created_at: String,
}

/// Insert payload for mentions; the id is assigned by SQLite.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::symbol_mentions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewSymbolMentionDB {
    pub symbol: String,
    pub source: Option<String>,
    pub mentioned_at: String,
    pub created_at: String,
}

/// Database model for one watchlist entry.
#[derive(
    Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::watchlist)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WatchlistEntryDB {
    pub symbol: String,
    pub added_at: String,
}

/// Row shape for the grouped mention-count queries.
#[derive(QueryableByName, Debug)]
pub struct MentionCountRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub symbol: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub mention_count: i64,
}
