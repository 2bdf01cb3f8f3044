//! Write scheduling for the notes document.
//!
//! Two ways to persist a payload:
//!
//! - [`Persister::flush_async`] coalesces bursts of live edits: each call
//!   replaces the pending write and the last payload lands after the delay.
//! - [`Persister::flush_now`] writes immediately and supersedes any pending
//!   coalesced write. If it fails, the pending write is left to land.
//!
//! Every write is tagged with a generation taken under `gate`. A coalesced
//! write only lands if its generation is still the latest one, and a
//! successful `flush_now` bumps the generation while holding the same lock it
//! writes under, so a stale coalesced write can never land after it.

use log::{debug, error, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::traits::{KeyValueStorage, StorageError};

pub struct Persister {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    delay: Duration,
    gate: Arc<Mutex<u64>>,
    pending: Option<JoinHandle<()>>,
    deferred_error: Arc<Mutex<Option<StorageError>>>,
}

impl Persister {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>, delay: Duration) -> Self {
        Self {
            storage,
            key: key.into(),
            delay,
            gate: Arc::new(Mutex::new(0)),
            pending: None,
            deferred_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the currently stored payload
    pub fn read(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(&self.key)
    }

    /// Schedule `payload` to be written after the delay, replacing any pending write.
    ///
    /// Outside a tokio runtime there is no timer to coalesce on, so the write
    /// happens immediately. Failures of scheduled writes are logged and kept
    /// for [`Persister::take_deferred_error`].
    pub fn flush_async(&mut self, payload: String) {
        self.cancel_pending();
        let generation = {
            let mut current = lock(&self.gate);
            *current += 1;
            *current
        };

        match Handle::try_current() {
            Ok(handle) => {
                let storage = Arc::clone(&self.storage);
                let gate = Arc::clone(&self.gate);
                let deferred_error = Arc::clone(&self.deferred_error);
                let key = self.key.clone();
                let delay = self.delay;

                self.pending = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    write_if_current(&gate, generation, storage.as_ref(), &key, &payload, &deferred_error);
                }));
            }
            Err(_) => {
                debug!("No async runtime available, writing '{}' immediately", self.key);
                write_if_current(
                    &self.gate,
                    generation,
                    self.storage.as_ref(),
                    &self.key,
                    &payload,
                    &self.deferred_error,
                );
            }
        }
    }

    /// Write `payload` right away. A pending coalesced write is only
    /// cancelled once this write has landed; on failure it stays scheduled.
    pub fn flush_now(&mut self, payload: &str) -> Result<(), StorageError> {
        {
            let mut generation = lock(&self.gate);
            self.storage.set(&self.key, payload)?;
            *generation += 1;
        }
        self.cancel_pending();

        debug!("Flushed {} bytes to '{}'", payload.len(), self.key);
        Ok(())
    }

    /// Whether a coalesced write is still waiting to land
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Failure of the most recent coalesced write, if any
    pub fn take_deferred_error(&self) -> Option<StorageError> {
        lock(&self.deferred_error).take()
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Cancelling pending write to '{}'", self.key);
            }
            handle.abort();
        }
    }
}

fn write_if_current(
    gate: &Mutex<u64>,
    generation: u64,
    storage: &dyn KeyValueStorage,
    key: &str,
    payload: &str,
    deferred_error: &Mutex<Option<StorageError>>,
) {
    let current = lock(gate);
    if *current != generation {
        warn!("Dropping superseded write to '{}'", key);
        return;
    }

    match storage.set(key, payload) {
        Ok(()) => debug!("Coalesced write of {} bytes to '{}'", payload.len(), key),
        Err(e) => {
            error!("Failed to save '{}': {}", key, e);
            *lock(deferred_error) = Some(e);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::MemoryStorage;

    fn persister(storage: &Arc<MemoryStorage>) -> Persister {
        let storage: Arc<dyn KeyValueStorage> = storage.clone();
        Persister::new(storage, "notes_data", Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_bursts_are_coalesced_into_one_write() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persister = persister(&storage);

        persister.flush_async("v1".to_string());
        persister.flush_async("v2".to_string());
        persister.flush_async("v3".to_string());
        assert!(persister.has_pending());
        assert_eq!(storage.get("notes_data").unwrap(), None);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(storage.get("notes_data").unwrap().as_deref(), Some("v3"));
        assert_eq!(storage.write_count(), 1);
        assert!(!persister.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_supersedes_pending_write() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persister = persister(&storage);

        persister.flush_async("stale".to_string());
        persister.flush_now("fresh").unwrap();
        assert!(!persister.has_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(storage.get("notes_data").unwrap().as_deref(), Some("fresh"));
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_coalesced_write_is_reported_later() {
        let storage = Arc::new(MemoryStorage::with_quota(4));
        let mut persister = persister(&storage);

        persister.flush_async("far too large".to_string());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(matches!(
            persister.take_deferred_error(),
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert!(persister.take_deferred_error().is_none());
    }

    #[test]
    fn test_without_runtime_writes_immediately() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persister = persister(&storage);

        persister.flush_async("now".to_string());
        assert!(!persister.has_pending());
        assert_eq!(storage.get("notes_data").unwrap().as_deref(), Some("now"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_now_keeps_pending_write() {
        let storage = Arc::new(MemoryStorage::with_quota(32));
        let mut persister = persister(&storage);

        persister.flush_async("edit".to_string());
        assert!(persister.flush_now("a payload that cannot possibly fit").is_err());
        assert!(persister.has_pending());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(storage.get("notes_data").unwrap().as_deref(), Some("edit"));
        assert!(persister.take_deferred_error().is_none());
    }

    #[test]
    fn test_flush_now_propagates_failure() {
        let storage = Arc::new(MemoryStorage::with_quota(4));
        let mut persister = persister(&storage);
        assert!(persister.flush_now("far too large").is_err());
        assert_eq!(storage.get("notes_data").unwrap(), None);
    }
}
