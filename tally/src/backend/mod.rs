//! # Backend Module
//!
//! Contains all non-UI logic for the tally application.
//!
//! This module brings together:
//! - **Domain**: keypad arithmetic, notes, summaries, history, export and backup rules
//! - **Storage**: key-value persistence, coalesced writes and preferences
//! - **IO**: the surfaces the UI and exporters plug into, plus DTO mappers
//!
//! ## Architecture
//!
//! ```text
//! UI (any renderer implementing CellSurface)
//!     ↓
//! Session (TallySession: keypad + note store)
//!     ↓
//! Domain Layer (NoteService, evaluator, summaries)
//!     ↓
//! Storage Layer (KeyValueStorage + Persister)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod logging;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::backend::config::TallyConfig;
use crate::backend::domain::{NoteService, TallySession};
use crate::backend::io::CellSurface;
use crate::backend::storage::{FileStorage, KeyValueStorage, PreferencesRepository};

/// Everything an embedding application needs, wired against one data directory
pub struct AppState {
    pub config: TallyConfig,
    pub storage: Arc<dyn KeyValueStorage>,
    pub note_service: NoteService,
    pub preferences: PreferencesRepository,
}

impl AppState {
    /// Hand the note store to a session bound to the given UI surface
    pub fn into_session<V: CellSurface>(self, surface: V) -> TallySession<V> {
        TallySession::new(self.note_service, surface)
    }
}

/// Initialize the backend with file-backed storage under the configured directory
pub fn initialize_backend(config: TallyConfig) -> Result<AppState> {
    config.validate()?;

    info!("Setting up storage in {}", config.data_directory.display());
    let storage: Arc<dyn KeyValueStorage> = Arc::new(
        FileStorage::new(&config.data_directory).with_context(|| {
            format!(
                "Failed to open data directory {}",
                config.data_directory.display()
            )
        })?,
    );

    info!("Loading notes");
    let note_service = NoteService::load(Arc::clone(&storage), &config);
    let preferences = PreferencesRepository::new(Arc::clone(&storage));

    info!(
        "Backend ready with {} note(s), active note {}",
        note_service.notes().len(),
        note_service.current_note_id()
    );

    Ok(AppState {
        config,
        storage,
        note_service,
        preferences,
    })
}
