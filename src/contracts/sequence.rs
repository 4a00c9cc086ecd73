use crate::contracts::error::SequenceError;

/// Persisted named counters.
///
/// # Invariants
/// - `seq` for a name never decreases
/// - Each post-increment value is observed by exactly one caller
/// - Every mutation of one name is linearizable with every other mutation of
///   that name (no read-then-write windows)
pub trait SequenceStore: Send + Sync {
    /// Creates the counter at 0 if it does not exist. Idempotent.
    fn ensure_exists(&self, name: &str) -> Result<(), SequenceError>;

    /// Atomically increments the counter and returns the new value.
    /// A missing counter is created by the same step and yields 1.
    fn increment_and_get(&self, name: &str) -> Result<i64, SequenceError>;

    /// Atomically raises the counter to `value` if it is currently lower.
    /// Returns the counter after the call.
    fn advance_to_at_least(&self, name: &str, value: i64) -> Result<i64, SequenceError>;

    /// Returns the current counter without modifying it.
    fn current(&self, name: &str) -> Result<Option<i64>, SequenceError>;
}
