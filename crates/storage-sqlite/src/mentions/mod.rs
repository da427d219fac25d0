mod model;
mod repository;

pub use model::{MentionCountRow, NewSymbolMentionDB, SymbolMentionDB, WatchlistEntryDB};
pub use repository::MentionRepository;
