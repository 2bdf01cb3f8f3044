//! # Storage Module
//!
//! Handles all data persistence for the tally application.
//!
//! Everything is stored as string values under string keys, mirroring the
//! browser storage the app was designed around: the notes document lives under
//! one key, preferences under another.
//!
//! ## Key Responsibilities
//!
//! - **Storage Abstraction**: [`KeyValueStorage`] with in-memory and file-backed implementations
//! - **Write Scheduling**: [`Persister`] coalesces live edits and performs synchronous checkpoints
//! - **Preferences**: app-wide settings that don't belong to any note

pub mod file;
pub mod memory;
pub mod persistence;
pub mod preferences_repository;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persistence::Persister;
pub use preferences_repository::{Preferences, PreferencesRepository};
pub use traits::{KeyValueStorage, StorageError};
