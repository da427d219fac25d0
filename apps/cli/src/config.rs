//! Environment-driven configuration.

const DEFAULT_DB_PATH: &str = "stockpulse.db";

pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path =
            std::env::var("STOCKPULSE_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        Self { db_path }
    }
}
