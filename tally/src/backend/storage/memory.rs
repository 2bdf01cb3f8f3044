use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use super::traits::{KeyValueStorage, StorageError};

/// In-memory storage with an optional byte quota.
///
/// The quota counts key and value bytes across all entries, which is how
/// browser storage reports "quota exceeded".
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Mutex<Option<usize>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::default();
        storage.set_quota(Some(bytes));
        storage
    }

    /// Change (or lift) the quota; existing entries are kept either way
    pub fn set_quota(&self, bytes: Option<usize>) {
        *lock(&self.quota) = bytes;
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);

        if let Some(quota) = *lock(&self.quota) {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let required = others + key.len() + value.len();
            if required > quota {
                debug!("Rejecting write of {} bytes to '{}': quota {}", value.len(), key, quota);
                return Err(StorageError::QuotaExceeded {
                    required,
                    available: quota,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(lock(&self.entries).remove(key).is_some())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("notes_data").unwrap(), None);

        storage.set("notes_data", "{}").unwrap();
        assert_eq!(storage.get("notes_data").unwrap().as_deref(), Some("{}"));
        assert_eq!(storage.write_count(), 1);

        assert!(storage.remove("notes_data").unwrap());
        assert!(!storage.remove("notes_data").unwrap());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_quota_rejects_oversized_write_and_keeps_old_value() {
        let storage = MemoryStorage::with_quota(20);
        storage.set("k", "small").unwrap();

        let err = storage.set("k", "this value is far too long").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { available: 20, .. }));
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("small"));

        storage.set_quota(None);
        storage.set("k", "this value is far too long").unwrap();
    }

    #[test]
    fn test_quota_counts_other_keys() {
        let storage = MemoryStorage::with_quota(10);
        storage.set("a", "1234").unwrap();
        // 5 bytes used by "a"; 1 + 5 more would make 11
        assert!(storage.set("b", "12345").is_err());
        storage.set("b", "1234").unwrap();
    }
}
