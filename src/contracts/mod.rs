pub mod error;
pub mod schema;
pub mod sequence;
pub mod storage;

pub use error::{DeskError, LockResultExt, SequenceError, StorageError};
pub use schema::{
    Assignment, AssignmentPatch, SequenceRecord, User, ASSIGNMENT_COLLECTION,
    SEQUENCE_COLLECTION, USER_COLLECTION,
};
pub use sequence::SequenceStore;
pub use storage::{AssignmentStore, Store, UserStore};
