use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rocksdb::{Options, WriteOptions, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::contracts::{
    Assignment, AssignmentPatch, AssignmentStore, LockResultExt, StorageError, User, UserStore,
    ASSIGNMENT_COLLECTION, SEQUENCE_COLLECTION, USER_COLLECTION,
};

/// RocksDB-backed document store.
///
/// Each collection lives under its own key prefix (`{collection}:{id}`) and
/// every value is a bincode-encoded record. Unique keys are enforced here:
/// inserts run their existence check and write under a per-collection lock,
/// so two racing inserts of the same key cannot both succeed.
pub struct RocksDbStore {
    db: DB,
    /// Per-namespace counter locks (lock-free map, one mutex per counter)
    sequence_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Serializes read-modify-write on assignment keys
    assignment_lock: Mutex<()>,
    /// Serializes insert-if-absent on user emails
    user_lock: Mutex<()>,
    data_path: PathBuf,
}

impl RocksDbStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        // Compression: LZ4 is fast with decent compression
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        // Records are small and write rates low; modest buffers are plenty
        opts.set_write_buffer_size(8 * 1024 * 1024);
        opts.set_max_write_buffer_number(2);

        let parallelism = std::thread::available_parallelism()
            .map(|p| p.get() as i32)
            .unwrap_or(2);
        opts.increase_parallelism(parallelism.min(4));

        let db = DB::open(&opts, path).map_err(|e| StorageError::RocksDb(e.to_string()))?;

        tracing::debug!(path = %path.display(), "RocksDB store opened");

        Ok(Self {
            db,
            sequence_locks: DashMap::new(),
            assignment_lock: Mutex::new(()),
            user_lock: Mutex::new(()),
            data_path: path.to_path_buf(),
        })
    }

    /// Directory this store was opened from.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Creates a collection key.
    pub(super) fn key(collection: &str, id: impl std::fmt::Display) -> String {
        format!("{}:{}", collection, id)
    }

    fn assignment_key(unique_no: i64) -> String {
        Self::key(ASSIGNMENT_COLLECTION, unique_no)
    }

    fn user_key(email: &str) -> String {
        Self::key(USER_COLLECTION, email)
    }

    pub(super) fn sequence_key(name: &str) -> String {
        Self::key(SEQUENCE_COLLECTION, name)
    }

    /// Returns the lock guarding one counter namespace.
    /// DashMap entry API gives an atomic get-or-insert.
    pub(super) fn sequence_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let entry = self
            .sequence_locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }

    /// Write options with WAL enabled: credentials and counters must survive
    /// a crash.
    fn write_options() -> WriteOptions {
        WriteOptions::default()
    }

    /// Reads and decodes one record.
    pub(super) fn get_record<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(bytes)) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::RocksDb(e.to_string())),
        }
    }

    /// Encodes and writes one record.
    pub(super) fn put_record<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes =
            bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db
            .put_opt(key.as_bytes(), bytes, &Self::write_options())
            .map_err(|e| StorageError::RocksDb(e.to_string()))
    }

    fn key_exists(&self, key: &str) -> Result<bool, StorageError> {
        self.db
            .get_pinned(key.as_bytes())
            .map(|v| v.is_some())
            .map_err(|e| StorageError::RocksDb(e.to_string()))
    }
}

impl AssignmentStore for RocksDbStore {
    fn insert_assignment(&self, assignment: &Assignment) -> Result<(), StorageError> {
        let key = Self::assignment_key(assignment.unique_no);
        let _guard = self.assignment_lock.lock().map_lock_err()?;

        if self.key_exists(&key)? {
            return Err(StorageError::DuplicateKey {
                collection: ASSIGNMENT_COLLECTION,
                key: assignment.unique_no.to_string(),
            });
        }

        self.put_record(&key, assignment)
    }

    fn get_assignment(&self, unique_no: i64) -> Result<Option<Assignment>, StorageError> {
        self.get_record(&Self::assignment_key(unique_no))
    }

    fn update_assignment(
        &self,
        unique_no: i64,
        patch: &AssignmentPatch,
    ) -> Result<Option<Assignment>, StorageError> {
        let key = Self::assignment_key(unique_no);
        // Held across read and write so a concurrent delete cannot be undone
        let _guard = self.assignment_lock.lock().map_lock_err()?;

        let Some(mut assignment) = self.get_record::<Assignment>(&key)? else {
            return Ok(None);
        };

        if !patch.is_empty() {
            assignment.apply(patch);
            self.put_record(&key, &assignment)?;
        }

        Ok(Some(assignment))
    }

    fn delete_assignment(&self, unique_no: i64) -> Result<bool, StorageError> {
        let key = Self::assignment_key(unique_no);
        let _guard = self.assignment_lock.lock().map_lock_err()?;

        if !self.key_exists(&key)? {
            return Ok(false);
        }

        self.db
            .delete_opt(key.as_bytes(), &Self::write_options())
            .map_err(|e| StorageError::RocksDb(e.to_string()))?;
        Ok(true)
    }
}

impl UserStore for RocksDbStore {
    fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let key = Self::user_key(&user.email);
        let _guard = self.user_lock.lock().map_lock_err()?;

        if self.key_exists(&key)? {
            return Err(StorageError::DuplicateKey {
                collection: USER_COLLECTION,
                key: user.email.clone(),
            });
        }

        self.put_record(&key, user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.get_record(&Self::user_key(email))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn create_test_store() -> (RocksDbStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn assignment(unique_no: i64) -> Assignment {
        Assignment {
            title: format!("Assignment {}", unique_no),
            description: "Read chapter three".into(),
            due_date: Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap(),
            unique_no,
        }
    }

    #[test]
    fn insert_then_get_returns_record() {
        let (store, _dir) = create_test_store();
        store.insert_assignment(&assignment(1)).unwrap();
        assert_eq!(store.get_assignment(1).unwrap(), Some(assignment(1)));
        assert_eq!(store.get_assignment(2).unwrap(), None);
    }

    #[test]
    fn duplicate_insert_fails_with_duplicate_key() {
        let (store, _dir) = create_test_store();
        store.insert_assignment(&assignment(3)).unwrap();

        let err = store.insert_assignment(&assignment(3)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::DuplicateKey {
                collection: ASSIGNMENT_COLLECTION,
                ..
            }
        ));
    }

    #[test]
    fn negative_and_zero_numbers_are_distinct_keys() {
        let (store, _dir) = create_test_store();
        store.insert_assignment(&assignment(0)).unwrap();
        store.insert_assignment(&assignment(-1)).unwrap();
        assert!(store.get_assignment(0).unwrap().is_some());
        assert!(store.get_assignment(-1).unwrap().is_some());
    }

    #[test]
    fn update_keeps_fields_not_in_patch() {
        let (store, _dir) = create_test_store();
        store.insert_assignment(&assignment(4)).unwrap();

        let updated = store
            .update_assignment(
                4,
                &AssignmentPatch {
                    title: Some("X".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "X");
        assert_eq!(updated.description, "Read chapter three");
        assert_eq!(store.get_assignment(4).unwrap(), Some(updated));
    }

    #[test]
    fn update_missing_record_returns_none() {
        let (store, _dir) = create_test_store();
        let result = store
            .update_assignment(9, &AssignmentPatch::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn delete_removes_exactly_one_record() {
        let (store, _dir) = create_test_store();
        store.insert_assignment(&assignment(5)).unwrap();
        store.insert_assignment(&assignment(6)).unwrap();

        assert!(store.delete_assignment(5).unwrap());
        assert!(!store.delete_assignment(5).unwrap());
        assert!(store.get_assignment(5).unwrap().is_none());
        assert!(store.get_assignment(6).unwrap().is_some());
    }

    #[test]
    fn users_are_unique_by_email() {
        let (store, _dir) = create_test_store();
        let user = User {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$10$hash".into(),
        };
        store.insert_user(&user).unwrap();

        let err = store.insert_user(&user).unwrap_err();
        assert!(matches!(
            err,
            StorageError::DuplicateKey {
                collection: USER_COLLECTION,
                ..
            }
        ));
        assert_eq!(
            store.find_user_by_email("ada@example.com").unwrap(),
            Some(user)
        );
        assert!(store.find_user_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksDbStore::open(dir.path()).unwrap();
            store.insert_assignment(&assignment(11)).unwrap();
        }
        let store = RocksDbStore::open(dir.path()).unwrap();
        assert_eq!(store.get_assignment(11).unwrap(), Some(assignment(11)));
        assert_eq!(store.data_path(), dir.path());
    }
}
