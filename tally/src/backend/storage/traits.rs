//! # Storage Traits
//!
//! The storage abstraction the domain layer persists through. Implementations
//! can be swapped (memory, files, a browser bridge) without touching the
//! domain.

use thiserror::Error;

/// Errors a storage backend can report
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {required} bytes needed, {available} available")]
    QuotaExceeded { required: usize, available: usize },

    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait defining a string key-value store
///
/// `set` either stores the whole value or fails leaving the previous value in
/// place; callers rely on that to keep the in-memory model consistent.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; returns true if something was removed
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}
