use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection holding user credentials.
pub const USER_COLLECTION: &str = "loginDetails";
/// Collection holding assignment records.
pub const ASSIGNMENT_COLLECTION: &str = "assignmentDetails";
/// Collection holding named counters.
pub const SEQUENCE_COLLECTION: &str = "sequences";

/// An assignment record, keyed by `unique_no`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub unique_no: i64,
}

impl Assignment {
    /// Overwrites only the fields present in `patch`.
    pub fn apply(&mut self, patch: &AssignmentPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }
}

/// Partial update of an assignment. `None` leaves the stored field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.due_date.is_none()
    }
}

/// A registered user. `password_hash` is a bcrypt hash, never plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Persisted form of a named counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub name: String,
    pub seq: i64,
}
