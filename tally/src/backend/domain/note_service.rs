//! Owner of every note, the active note and their persistence.
//!
//! All note mutations go through [`NoteService`]. Each one builds the next
//! state, serializes the whole document and hands it to the [`Persister`]:
//!
//! - live edits (counts, names, settings, colour, new notes) are coalesced;
//! - history changes, restores, switching and deleting notes write
//!   synchronously, and the in-memory state only changes once that write
//!   succeeded.

use log::{debug, info, warn};
use shared::{Currency, NotesDocument};
use std::sync::Arc;
use thiserror::Error;

use crate::backend::config::TallyConfig;
use crate::backend::domain::commands::{AddSavedPointCommand, CreateNoteCommand};
use crate::backend::domain::models::{
    denomination, Counts, Note, NoteSettings, NoteSettingsPatch, SavedPoint,
};
use crate::backend::domain::summary::{self, Summary};
use crate::backend::io::mappers::NoteMapper;
use crate::backend::storage::{KeyValueStorage, Persister, StorageError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to serialize notes: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored notes are unreadable: {0}")]
    InvalidDocument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushMode {
    Coalesced,
    Now,
}

#[derive(Debug, Clone)]
struct NotesState {
    current_note_id: String,
    /// Never empty
    notes: Vec<Note>,
}

impl NotesState {
    fn fresh(prefix: &str) -> Self {
        let note = Note::new(numbered_name(prefix, 1), Currency::default(), NoteSettings::default());
        Self {
            current_note_id: note.id.clone(),
            notes: vec![note],
        }
    }

    fn current(&self) -> &Note {
        self.notes
            .iter()
            .find(|note| note.id == self.current_note_id)
            .unwrap_or(&self.notes[0])
    }

    fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id == note_id)
    }
}

pub struct NoteService {
    state: NotesState,
    persister: Persister,
    max_saved_points: usize,
    default_note_name: String,
}

impl NoteService {
    /// Load notes from `storage`.
    ///
    /// Nothing stored yields one fresh note, which is persisted. Unreadable
    /// data also yields a fresh note but is left in storage until the next
    /// change overwrites it.
    pub fn load(storage: Arc<dyn KeyValueStorage>, config: &TallyConfig) -> Self {
        let persister = Persister::new(storage, config.storage_key.clone(), config.save_debounce());

        let (state, needs_save) = match read_state(&persister) {
            Ok(Some(state)) => {
                info!("Loaded {} note(s) from '{}'", state.notes.len(), persister.key());
                (state, false)
            }
            Ok(None) => {
                info!("No notes stored under '{}', starting fresh", persister.key());
                (NotesState::fresh(&config.default_note_name), true)
            }
            Err(e) => {
                warn!("Failed to load notes: {}. Starting with a default note.", e);
                (NotesState::fresh(&config.default_note_name), false)
            }
        };

        let mut service = Self {
            state,
            persister,
            max_saved_points: config.max_saved_points,
            default_note_name: config.default_note_name.clone(),
        };

        if needs_save {
            if let Err(e) = service.flush_async() {
                warn!("Failed to schedule initial save: {}", e);
            }
        }
        service
    }

    // === Queries ===

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.state.notes.iter().find(|note| note.id == note_id)
    }

    pub fn current_note(&self) -> &Note {
        self.state.current()
    }

    pub fn current_note_id(&self) -> &str {
        &self.current_note().id
    }

    pub fn current_currency(&self) -> Currency {
        self.current_note().currency
    }

    pub fn current_counts(&self) -> &Counts {
        &self.current_note().counts
    }

    pub fn current_summary(&self) -> Summary {
        let note = self.current_note();
        self.compute_summary(note.currency, &note.counts)
    }

    pub fn compute_summary(&self, currency: Currency, counts: &Counts) -> Summary {
        summary::compute_summary(currency, counts)
    }

    pub fn max_saved_points(&self) -> usize {
        self.max_saved_points
    }

    /// Snapshot of the persisted document shape
    pub fn document(&self) -> NotesDocument {
        NoteMapper::document_to_record(self.current_note_id(), &self.state.notes)
    }

    pub fn document_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    // === Notes ===

    /// Append a new empty note. The active note does not change.
    pub fn create_note(&mut self, command: CreateNoteCommand) -> Result<Note, StoreError> {
        let name = match command.name.trim() {
            "" => numbered_name(&self.default_note_name, self.state.notes.len() + 1),
            name => name.to_string(),
        };
        info!("Creating note: name={}, currency={}", name, command.currency);

        let note = Note::new(name, command.currency, command.settings);
        let mut candidate = self.state.clone();
        candidate.notes.push(note.clone());
        self.commit(candidate, FlushMode::Coalesced)?;

        info!("Created note {} ({})", note.name, note.id);
        Ok(note)
    }

    /// Make `note_id` the active note. Returns false if it doesn't exist.
    pub fn switch_note(&mut self, note_id: &str) -> Result<bool, StoreError> {
        if self.note(note_id).is_none() {
            warn!("Cannot switch to unknown note {}", note_id);
            return Ok(false);
        }

        let mut candidate = self.state.clone();
        candidate.current_note_id = note_id.to_string();
        self.commit(candidate, FlushMode::Now)?;

        info!("Switched to note {}", note_id);
        Ok(true)
    }

    /// Delete a note. Deleting the last note leaves a fresh default one.
    pub fn delete_note(&mut self, note_id: &str) -> Result<bool, StoreError> {
        info!("Deleting note: {}", note_id);

        let mut candidate = self.state.clone();
        let before = candidate.notes.len();
        candidate.notes.retain(|note| note.id != note_id);
        if candidate.notes.len() == before {
            warn!("Note not found: {}", note_id);
            return Ok(false);
        }

        if candidate.notes.is_empty() {
            info!("Deleted the last note, creating a default one");
            candidate = NotesState::fresh(&self.default_note_name);
        } else if candidate.current_note_id == note_id {
            candidate.current_note_id = candidate.notes[0].id.clone();
        }

        self.commit(candidate, FlushMode::Now)?;
        info!("Deleted note {}, active note is {}", note_id, self.current_note_id());
        Ok(true)
    }

    pub fn update_note_settings(
        &mut self,
        note_id: &str,
        patch: NoteSettingsPatch,
    ) -> Result<bool, StoreError> {
        debug!("Updating settings of note {}: {:?}", note_id, patch);
        self.update_note(note_id, FlushMode::Coalesced, |note| {
            note.settings = note.settings.merged(patch);
        })
    }

    /// Rename a note. A blank name is rejected with `Ok(false)`.
    pub fn update_note_name(&mut self, note_id: &str, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            warn!("Refusing to give note {} a blank name", note_id);
            return Ok(false);
        }
        self.update_note(note_id, FlushMode::Coalesced, |note| {
            note.name = name.to_string();
        })
    }

    /// Set or clear the accent colour tag of a note
    pub fn update_note_color(
        &mut self,
        note_id: &str,
        color: Option<String>,
    ) -> Result<bool, StoreError> {
        self.update_note(note_id, FlushMode::Coalesced, |note| {
            note.color = color;
        })
    }

    // === Counts ===

    /// Store the count of a denomination on the active note.
    ///
    /// Returns false for ids outside the active note's currency.
    pub fn set_count(&mut self, denomination_id: &str, count: &str) -> Result<bool, StoreError> {
        let note_id = self.current_note_id().to_string();
        if denomination::find(self.current_currency(), denomination_id).is_none() {
            warn!(
                "Ignoring count for {}: not a {} denomination",
                denomination_id,
                self.current_currency()
            );
            return Ok(false);
        }

        debug!("Setting {} = {} on note {}", denomination_id, count, note_id);
        self.update_note(&note_id, FlushMode::Coalesced, |note| {
            note.counts
                .insert(denomination_id.to_string(), count.to_string());
        })
    }

    /// Clear every count of the active note
    pub fn reset_counts(&mut self) -> Result<(), StoreError> {
        let note_id = self.current_note_id().to_string();
        info!("Resetting counts of note {}", note_id);
        self.update_note(&note_id, FlushMode::Coalesced, |note| note.counts.clear())?;
        Ok(())
    }

    // === History ===

    /// Record a save point at the head of a note's history.
    ///
    /// The history is trimmed to the configured maximum, dropping the oldest
    /// entries. Returns None if the note doesn't exist.
    pub fn add_saved_point(
        &mut self,
        command: AddSavedPointCommand,
    ) -> Result<Option<SavedPoint>, StoreError> {
        let Some(note) = self.note(&command.note_id) else {
            warn!("Cannot add save point to unknown note {}", command.note_id);
            return Ok(None);
        };

        let counts = Note::retain_known_counts(command.counts, note.currency);
        let point = SavedPoint::new(command.memo, counts, command.summary);
        let cap = self.max_saved_points;

        let mut candidate = self.state.clone();
        if let Some(note) = candidate.note_mut(&command.note_id) {
            note.push_saved_point(point.clone(), cap);
            note.touch();
        }
        self.commit(candidate, FlushMode::Now)?;

        info!("Saved point {} on note {}", point.id, command.note_id);
        Ok(Some(point))
    }

    /// Save the active note's counts and totals under `memo`.
    ///
    /// A blank memo is replaced by one derived from the total.
    pub fn save_checkpoint(&mut self, memo: &str) -> Result<Option<SavedPoint>, StoreError> {
        let note = self.current_note();
        let totals = self.current_summary();
        let memo = match memo.trim() {
            "" => summary::default_memo(note.currency, totals.total),
            memo => memo.to_string(),
        };
        let command = AddSavedPointCommand {
            note_id: note.id.clone(),
            memo,
            counts: note.counts.clone(),
            summary: totals,
        };
        self.add_saved_point(command)
    }

    pub fn delete_saved_point(
        &mut self,
        note_id: &str,
        saved_point_id: &str,
    ) -> Result<bool, StoreError> {
        let exists = self
            .note(note_id)
            .map_or(false, |note| note.saved_point(saved_point_id).is_some());
        if !exists {
            warn!("Save point {} not found on note {}", saved_point_id, note_id);
            return Ok(false);
        }

        info!("Deleting save point {} from note {}", saved_point_id, note_id);
        self.update_note(note_id, FlushMode::Now, |note| {
            note.saved_points.retain(|sp| sp.id != saved_point_id);
        })
    }

    /// Replace a note's counts wholesale. Unknown denomination ids are dropped.
    pub fn restore_counts(&mut self, note_id: &str, counts: Counts) -> Result<bool, StoreError> {
        let Some(currency) = self.note(note_id).map(|note| note.currency) else {
            warn!("Cannot restore counts of unknown note {}", note_id);
            return Ok(false);
        };

        let counts = Note::retain_known_counts(counts, currency);
        info!("Restoring {} count(s) on note {}", counts.len(), note_id);
        self.update_note(note_id, FlushMode::Now, |note| note.counts = counts)
    }

    // === Persistence ===

    /// Write the current state right away, superseding any pending write
    pub fn flush_now(&mut self) -> Result<(), StoreError> {
        let payload = serialize(&self.state)?;
        self.persister.flush_now(&payload)?;
        Ok(())
    }

    /// Schedule a coalesced write of the current state
    pub fn flush_async(&mut self) -> Result<(), StoreError> {
        let payload = serialize(&self.state)?;
        self.persister.flush_async(payload);
        Ok(())
    }

    pub fn has_pending_flush(&self) -> bool {
        self.persister.has_pending()
    }

    /// Failure of the most recent coalesced write, if any
    pub fn take_deferred_error(&self) -> Option<StorageError> {
        self.persister.take_deferred_error()
    }

    /// Rebuild the in-memory state from storage.
    ///
    /// Nothing stored yields a fresh default note, which is written back so
    /// it keeps its id across restarts. Unreadable data is an error and
    /// leaves the current state in place.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        match read_state(&self.persister)? {
            Some(state) => self.state = state,
            None => {
                info!("No notes to reload, starting fresh");
                self.state = NotesState::fresh(&self.default_note_name);
                self.flush_now()?;
            }
        }
        info!("Reloaded {} note(s)", self.state.notes.len());
        Ok(())
    }

    /// Replace the stored document with `raw` and reload from it
    pub fn import_raw_document(&mut self, raw: &str) -> Result<(), StoreError> {
        self.persister.flush_now(raw)?;
        self.reload()
    }

    fn update_note<F>(&mut self, note_id: &str, mode: FlushMode, apply: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Note),
    {
        let mut candidate = self.state.clone();
        let Some(note) = candidate.note_mut(note_id) else {
            warn!("Note not found: {}", note_id);
            return Ok(false);
        };
        apply(note);
        note.touch();

        self.commit(candidate, mode)?;
        Ok(true)
    }

    fn commit(&mut self, candidate: NotesState, mode: FlushMode) -> Result<(), StoreError> {
        let payload = serialize(&candidate)?;
        match mode {
            FlushMode::Now => self.persister.flush_now(&payload)?,
            FlushMode::Coalesced => self.persister.flush_async(payload),
        }
        self.state = candidate;
        Ok(())
    }
}

fn numbered_name(prefix: &str, number: usize) -> String {
    format!("{} {}", prefix, number)
}

fn serialize(state: &NotesState) -> Result<String, StoreError> {
    let document = NoteMapper::document_to_record(&state.current().id, &state.notes);
    Ok(serde_json::to_string(&document)?)
}

fn read_state(persister: &Persister) -> Result<Option<NotesState>, StoreError> {
    let Some(raw) = persister.read()? else {
        return Ok(None);
    };

    let document: NotesDocument = serde_json::from_str(&raw)?;
    let (current_note_id, notes) = NoteMapper::document_to_domain(document)
        .map_err(|e| StoreError::InvalidDocument(format!("{:#}", e)))?;

    let Some(first) = notes.first() else {
        warn!("Stored document has no notes");
        return Ok(None);
    };

    let current_note_id = match current_note_id {
        Some(id) if notes.iter().any(|note| note.id == id) => id,
        other => {
            if let Some(id) = other {
                warn!("Active note {} no longer exists, using the first note", id);
            }
            first.id.clone()
        }
    };

    Ok(Some(NotesState {
        current_note_id,
        notes,
    }))
}
