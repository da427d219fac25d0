/// Classification for retry policy.
///
/// Used to decide how a caller should respond to a [`FetchError`](super::FetchError).
///
/// | Class | Retry? |
/// |-------|--------|
/// | `Never` | No - the request is fundamentally invalid or the payload is bad |
/// | `WithBackoff` | Yes - wait a growing delay, then try again (bounded by the caller) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, malformed payload, or provider-side rejection.
    Never,

    /// Retry after a delay that doubles per attempt.
    ///
    /// Used for transient conditions like rate limiting (429), timeouts,
    /// and transport failures. Callers bound the number of attempts.
    WithBackoff,
}
