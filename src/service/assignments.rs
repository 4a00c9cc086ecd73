use std::sync::Arc;

use crate::contracts::{
    Assignment, AssignmentPatch, AssignmentStore, DeskError, SequenceStore, StorageError,
};
use crate::service::allocator::{CounterPolicy, UniqueNumberAllocator};
use crate::service::dates::DueDateInput;

/// Input for creating an assignment.
#[derive(Debug, Clone, Default)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub due_date: Option<DueDateInput>,
    pub unique_no: Option<i64>,
}

/// Input for a partial update. Blank due dates are ignored.
#[derive(Debug, Clone, Default)]
pub struct AssignmentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DueDateInput>,
}

/// Assignment use cases: create (with identifier allocation), lookup,
/// partial update and delete.
pub struct AssignmentService<S> {
    store: Arc<S>,
    allocator: UniqueNumberAllocator<S>,
}

impl<S: SequenceStore + AssignmentStore> AssignmentService<S> {
    pub fn new(store: Arc<S>, policy: CounterPolicy) -> Self {
        Self {
            allocator: UniqueNumberAllocator::new(Arc::clone(&store), policy),
            store,
        }
    }

    pub fn allocator(&self) -> &UniqueNumberAllocator<S> {
        &self.allocator
    }

    /// Creates an assignment and returns it.
    ///
    /// The due date is validated before anything is allocated or written.
    pub fn create(&self, input: NewAssignment) -> Result<Assignment, DeskError> {
        let due_date = match input.due_date {
            Some(ref raw) => raw.parse()?,
            None => return Err(DeskError::InvalidDate(String::new())),
        };

        let unique_no = self.allocator.allocate(input.unique_no)?;

        let assignment = Assignment {
            title: input.title,
            description: input.description,
            due_date,
            unique_no,
        };

        match self.store.insert_assignment(&assignment) {
            Ok(()) => {
                tracing::info!(unique_no, "Assignment created");
                Ok(assignment)
            }
            Err(StorageError::DuplicateKey { .. }) => {
                tracing::warn!(unique_no, "Unique number taken at insert");
                Err(DeskError::DuplicateIdentifier(unique_no))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find(&self, unique_no: i64) -> Result<Option<Assignment>, DeskError> {
        Ok(self.store.get_assignment(unique_no)?)
    }

    /// Applies the supplied fields and returns the updated record.
    pub fn update(&self, unique_no: i64, update: AssignmentUpdate) -> Result<Assignment, DeskError> {
        let due_date = match update.due_date {
            Some(ref raw) if !raw.is_blank() => Some(raw.parse()?),
            _ => None,
        };

        let patch = AssignmentPatch {
            title: update.title,
            description: update.description,
            due_date,
        };

        let updated = self
            .store
            .update_assignment(unique_no, &patch)?
            .ok_or(DeskError::NotFound("Assignment"))?;

        tracing::info!(unique_no, "Assignment updated");
        Ok(updated)
    }

    pub fn delete(&self, unique_no: i64) -> Result<(), DeskError> {
        if !self.store.delete_assignment(unique_no)? {
            return Err(DeskError::NotFound("Assignment"));
        }
        tracing::info!(unique_no, "Assignment deleted");
        Ok(())
    }
}
