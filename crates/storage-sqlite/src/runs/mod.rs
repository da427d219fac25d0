//! SQLite storage for collection run audit rows and backfill progress.

mod model;
mod repository;

pub use model::{
    BackfillProgressDB, FinalizeCollectionDB, NewBackfillProgressDB, StockDataCollectionDB,
};
pub use repository::RunRepository;
