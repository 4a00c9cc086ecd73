use std::sync::{MutexGuard, PoisonError};

use axum::http::StatusCode;
use thiserror::Error;

/// Service-level failures, one variant per kind a caller can act on.
///
/// `status()` maps each kind onto the HTTP taxonomy: bad input and duplicate
/// keys are 400, missing records 404, credential failures 400 (no token
/// scheme exists, so never 401), and storage trouble 500.
#[derive(Error, Debug)]
pub enum DeskError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid date format. Please use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Unique number already exists. Please provide a different unique number or omit it to auto-generate.")]
    DuplicateIdentifier(i64),

    #[error("Email already registered")]
    DuplicateEmail(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeskError {
    /// HTTP status for this error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            DeskError::Validation(_)
            | DeskError::InvalidDate(_)
            | DeskError::DuplicateIdentifier(_)
            | DeskError::DuplicateEmail(_)
            | DeskError::UserNotFound
            | DeskError::InvalidCredentials => StatusCode::BAD_REQUEST,
            DeskError::NotFound(_) => StatusCode::NOT_FOUND,
            DeskError::PasswordHash(_)
            | DeskError::Storage(_)
            | DeskError::Sequence(_)
            | DeskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true for failures caused by the server rather than the request.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

/// Extension trait for converting lock errors to StorageError.
pub trait LockResultExt<T> {
    /// Converts a lock error to a StorageError.
    fn map_lock_err(self) -> Result<T, StorageError>;
}

impl<'a, T> LockResultExt<MutexGuard<'a, T>>
    for Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>
{
    #[inline]
    fn map_lock_err(self) -> Result<MutexGuard<'a, T>, StorageError> {
        self.map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A write hit an existing record under a unique key.
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey {
        collection: &'static str,
        key: String,
    },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Failed to persist sequence: {0}")]
    PersistFailed(#[from] StorageError),

    #[error("Sequence overflow")]
    Overflow,
}
