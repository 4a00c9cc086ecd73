use crate::contracts::{LockResultExt, SequenceError, SequenceRecord, SequenceStore};
use crate::storage::RocksDbStore;

/// Counters are find-and-modify under the namespace lock: the read, the new
/// value and the persisted write happen as one step, so no two callers can
/// observe the same post-increment value and the stored `seq` never moves
/// backwards.
impl SequenceStore for RocksDbStore {
    fn ensure_exists(&self, name: &str) -> Result<(), SequenceError> {
        let lock = self.sequence_lock(name);
        let _guard = lock.lock().map_lock_err()?;

        let key = Self::sequence_key(name);
        if self.get_record::<SequenceRecord>(&key)?.is_none() {
            self.put_record(
                &key,
                &SequenceRecord {
                    name: name.to_string(),
                    seq: 0,
                },
            )?;
            tracing::info!(sequence = name, "Created sequence");
        }
        Ok(())
    }

    fn increment_and_get(&self, name: &str) -> Result<i64, SequenceError> {
        let lock = self.sequence_lock(name);
        let _guard = lock.lock().map_lock_err()?;

        let key = Self::sequence_key(name);
        // Upsert: a missing row counts as 0 and is created by this write
        let current = self
            .get_record::<SequenceRecord>(&key)?
            .map(|r| r.seq)
            .unwrap_or(0);
        let next = current.checked_add(1).ok_or(SequenceError::Overflow)?;

        self.put_record(
            &key,
            &SequenceRecord {
                name: name.to_string(),
                seq: next,
            },
        )?;
        Ok(next)
    }

    fn advance_to_at_least(&self, name: &str, value: i64) -> Result<i64, SequenceError> {
        let lock = self.sequence_lock(name);
        let _guard = lock.lock().map_lock_err()?;

        let key = Self::sequence_key(name);
        let current = self.get_record::<SequenceRecord>(&key)?.map(|r| r.seq);

        match current {
            Some(seq) if seq >= value => Ok(seq),
            _ => {
                // A missing row is created at max(0, value)
                let seq = value.max(current.unwrap_or(0));
                self.put_record(
                    &key,
                    &SequenceRecord {
                        name: name.to_string(),
                        seq,
                    },
                )?;
                tracing::debug!(sequence = name, seq, "Advanced sequence");
                Ok(seq)
            }
        }
    }

    fn current(&self, name: &str) -> Result<Option<i64>, SequenceError> {
        Ok(self
            .get_record::<SequenceRecord>(&Self::sequence_key(name))?
            .map(|r| r.seq))
    }
}
