//! SQLite storage for current prices and daily history.

mod model;
mod repository;

pub use model::{NewStockPriceHistoryDB, StockPriceDB, StockPriceHistoryDB};
pub use repository::PriceRepository;
