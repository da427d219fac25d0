//! SQLite storage implementation for StockPulse.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `stockpulse-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for prices, collection runs, and mentions
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! All other crates (`core`, `market-data`) are database-agnostic and work with traits.
//!
//! ```text
//! core (domain)        market-data (providers)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod mentions;
pub mod prices;
pub mod runs;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export repositories at the crate root
pub use mentions::MentionRepository;
pub use prices::PriceRepository;
pub use runs::RunRepository;

// Re-export from stockpulse-core for convenience
pub use stockpulse_core::errors::{DatabaseError, Error, Result};
