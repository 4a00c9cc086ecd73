use std::sync::Arc;

use crate::contracts::{DeskError, StorageError, User, UserStore};

/// bcrypt work factor for stored passwords.
pub const HASH_COST: u32 = 10;

/// Registration and credential checks.
///
/// Both operations are CPU-bound (bcrypt); async callers should run them on
/// the blocking pool.
pub struct UserService<S> {
    store: Arc<S>,
    hash_cost: u32,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_hash_cost(store, HASH_COST)
    }

    /// Uses a custom bcrypt cost. Lower costs are only meant for tests.
    pub fn with_hash_cost(store: Arc<S>, hash_cost: u32) -> Self {
        Self { store, hash_cost }
    }

    /// Stores a new user with a salted hash of `password`.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<(), DeskError> {
        let password_hash = bcrypt::hash(password, self.hash_cost)
            .map_err(|e| DeskError::PasswordHash(e.to_string()))?;

        let user = User {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        };

        match self.store.insert_user(&user) {
            Ok(()) => {
                tracing::info!("User registered");
                Ok(())
            }
            Err(StorageError::DuplicateKey { .. }) => {
                Err(DeskError::DuplicateEmail(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks a password against the stored hash.
    ///
    /// A missing user is `UserNotFound`; a wrong password is `Ok(false)`.
    pub fn verify(&self, email: &str, password: &str) -> Result<bool, DeskError> {
        let user = self
            .store
            .find_user_by_email(email)?
            .ok_or(DeskError::UserNotFound)?;

        bcrypt::verify(password, &user.password_hash)
            .map_err(|e| DeskError::PasswordHash(e.to_string()))
    }
}
