//! StockPulse Core - Domain entities, services, and traits.
//!
//! This crate contains the price collection business logic for StockPulse.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod prices;

// Re-export common types from the prices module
pub use prices::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
