use std::str::FromStr;
use std::sync::Arc;

use crate::contracts::{AssignmentStore, DeskError, SequenceError, SequenceStore};

/// Counter namespace for assignment unique numbers.
pub const ASSIGNMENT_SEQUENCE: &str = "assignmentUniqueNo";

/// How explicit identifiers interact with the shared counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CounterPolicy {
    /// An accepted explicit number advances the counter to at least that
    /// number, so later auto-allocation cannot hand it out again.
    #[default]
    Reconcile,
    /// Explicit numbers never touch the counter. A later auto-allocation can
    /// collide with a manual number that is ahead of the counter; the insert
    /// then fails on the unique key.
    Independent,
}

impl FromStr for CounterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reconcile" => Ok(CounterPolicy::Reconcile),
            "independent" => Ok(CounterPolicy::Independent),
            other => Err(format!(
                "unknown counter policy `{other}`; expected reconcile|independent"
            )),
        }
    }
}

/// Hands out assignment identifiers from one namespace.
pub struct UniqueNumberAllocator<S> {
    store: Arc<S>,
    policy: CounterPolicy,
}

impl<S: SequenceStore + AssignmentStore> UniqueNumberAllocator<S> {
    pub fn new(store: Arc<S>, policy: CounterPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> CounterPolicy {
        self.policy
    }

    /// Makes sure the counter row exists. Safe to run on every startup and
    /// alongside concurrent allocations.
    pub fn bootstrap(&self) -> Result<(), DeskError> {
        self.store.ensure_exists(ASSIGNMENT_SEQUENCE)?;
        Ok(())
    }

    /// Returns an identifier for a new assignment.
    ///
    /// With no `requested` number the next counter value is returned as is.
    /// A requested number (zero and negatives included) is returned if no
    /// assignment holds it yet, and fails with `DuplicateIdentifier`
    /// otherwise. The check is optimistic; the store's unique key is what
    /// finally rejects a racing insert.
    ///
    /// Under `Reconcile`, `i64::MAX` is refused: the counter would be left
    /// with no next value.
    pub fn allocate(&self, requested: Option<i64>) -> Result<i64, DeskError> {
        let Some(unique_no) = requested else {
            let next = self
                .store
                .increment_and_get(ASSIGNMENT_SEQUENCE)
                .map_err(|e| match e {
                    SequenceError::Overflow => DeskError::Validation(
                        "Unique numbers are exhausted. Please provide a unique number.".into(),
                    ),
                    other => other.into(),
                })?;
            tracing::debug!(unique_no = next, "Allocated unique number");
            return Ok(next);
        };

        if self.policy == CounterPolicy::Reconcile && unique_no == i64::MAX {
            return Err(DeskError::Validation(format!(
                "Unique number must be below {}",
                i64::MAX
            )));
        }

        if self.store.get_assignment(unique_no)?.is_some() {
            return Err(DeskError::DuplicateIdentifier(unique_no));
        }

        if self.policy == CounterPolicy::Reconcile {
            self.store
                .advance_to_at_least(ASSIGNMENT_SEQUENCE, unique_no)?;
        }

        Ok(unique_no)
    }

    /// Current counter value, if the row exists.
    pub fn current(&self) -> Result<Option<i64>, DeskError> {
        Ok(self.store.current(ASSIGNMENT_SEQUENCE)?)
    }
}
