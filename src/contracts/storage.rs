use crate::contracts::error::StorageError;
use crate::contracts::schema::{Assignment, AssignmentPatch, User};
use crate::contracts::sequence::SequenceStore;

/// Assignment records keyed by their unique number.
///
/// # Invariants
/// - At most one record per `unique_no`; `insert_assignment` enforces this
///   atomically and fails with `StorageError::DuplicateKey` on violation,
///   even when a caller's earlier existence check raced with another insert
/// - Updates and deletes touch exactly one record
pub trait AssignmentStore: Send + Sync {
    /// Inserts a new record. Fails with `DuplicateKey` if the number is taken.
    fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StorageError>;

    /// Point lookup by unique number.
    fn get_assignment(&self, unique_no: i64) -> Result<Option<Assignment>, StorageError>;

    /// Applies a partial update. Returns the updated record, or `None` if no
    /// record matches.
    fn update_assignment(
        &self,
        unique_no: i64,
        patch: &AssignmentPatch,
    ) -> Result<Option<Assignment>, StorageError>;

    /// Removes one record. Returns false if no record matched.
    fn delete_assignment(&self, unique_no: i64) -> Result<bool, StorageError>;
}

/// User credentials keyed by email.
///
/// # Invariants
/// - At most one record per email; `insert_user` fails with `DuplicateKey`
///   on violation
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `DuplicateKey` if the email is taken.
    fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Point lookup by email.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
}

/// Everything the service needs from one backing store.
pub trait Store: SequenceStore + AssignmentStore + UserStore {}

impl<T: SequenceStore + AssignmentStore + UserStore> Store for T {}
