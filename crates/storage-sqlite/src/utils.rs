//! Helpers shared by the repository implementations.

/// Chunk size for `IN (...)` parameter lists.
///
/// SQLite caps the number of bound parameters per statement (historically
/// 999). 500 stays under the cap with room for the other parameters a
/// query might bind.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Split a slice into chunks that fit SQLite's parameter limit.
///
/// Queries filtering on a caller-supplied symbol list run once per chunk
/// and merge the results.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}
