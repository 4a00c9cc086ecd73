//! Use cases on top of the storage contracts.
//!
//! Services own the business rules (identifier allocation, date validation,
//! password hashing) and translate storage outcomes into `DeskError` kinds.
//! They are synchronous; the HTTP layer decides where they run.

pub mod allocator;
pub mod assignments;
pub mod dates;
pub mod users;

pub use allocator::{CounterPolicy, UniqueNumberAllocator, ASSIGNMENT_SEQUENCE};
pub use assignments::{AssignmentService, AssignmentUpdate, NewAssignment};
pub use dates::{parse_due_date, DueDateInput};
pub use users::{UserService, HASH_COST};
