//! The running application context: the note store, the keypad and the view.
//!
//! Every user gesture goes through [`TallySession`]. The store is the only
//! source of truth for counts; after each change the session pushes the
//! active note to the [`CellSurface`].

use chrono::Local;
use log::{debug, error, warn};

use crate::backend::domain::commands::CreateNoteCommand;
use crate::backend::domain::export_service::ExportSnapshot;
use crate::backend::domain::keypad::{Key, Keypad, KeypadOutcome};
use crate::backend::domain::models::{denomination, Note, NoteSettingsPatch, SavedPoint};
use crate::backend::domain::note_service::{NoteService, StoreError};
use crate::backend::domain::summary::{parse_count, Summary};
use crate::backend::io::CellSurface;
use crate::backend::storage::StorageError;

pub struct TallySession<V: CellSurface> {
    store: NoteService,
    keypad: Keypad,
    surface: V,
}

impl<V: CellSurface> TallySession<V> {
    /// Bind a store to a surface and draw the active note once
    pub fn new(store: NoteService, surface: V) -> Self {
        let mut session = Self {
            store,
            keypad: Keypad::new(),
            surface,
        };
        session.render();
        session
    }

    pub fn store(&self) -> &NoteService {
        &self.store
    }

    /// Direct store access. Call [`TallySession::render`] after mutating through it.
    pub fn store_mut(&mut self) -> &mut NoteService {
        &mut self.store
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn summary(&self) -> Summary {
        self.store.current_summary()
    }

    pub fn into_store(self) -> NoteService {
        self.store
    }

    /// Open the keypad on a denomination of the active note.
    ///
    /// Denominations of another currency or hidden by the note settings are
    /// ignored and return false.
    pub fn tap_cell(&mut self, denomination_id: &str) -> bool {
        let note = self.store.current_note();
        let Some(denomination) = denomination::find(note.currency, denomination_id) else {
            warn!("Ignoring tap on {}: not a {} denomination", denomination_id, note.currency);
            return false;
        };
        if denomination.is_hidden_by(&note.settings) {
            debug!("Ignoring tap on hidden denomination {}", denomination_id);
            return false;
        }

        let seed = note.count_of(denomination_id).to_string();
        self.keypad.begin(denomination_id, &seed);
        true
    }

    /// Header for the open keypad, e.g. `千円札 3000円（3枚）`
    pub fn keypad_caption(&self) -> Option<String> {
        let target = self.keypad.target()?;
        let note = self.store.current_note();
        let denomination = denomination::find(note.currency, target)?;

        let count = parse_count(note.count_of(target));
        let amount = denomination.amount_for(count).unwrap_or_default();
        Some(format!(
            "{} {}{}（{}枚）",
            denomination.label,
            amount.normalize(),
            note.currency.unit(),
            count.normalize()
        ))
    }

    /// Feed a key to the keypad. `Enter` stores the evaluated count.
    pub fn press(&mut self, key: Key) -> Result<KeypadOutcome, StoreError> {
        let outcome = self.keypad.press(key);
        if let KeypadOutcome::Commit {
            denomination_id,
            count,
        } = &outcome
        {
            self.store.set_count(denomination_id, count)?;
            self.render();
        }
        Ok(outcome)
    }

    /// Feed a key by its label ("7", "00", "×", "AC", "⇐", "=", "Enter", ...)
    pub fn press_label(&mut self, label: &str) -> Result<KeypadOutcome, StoreError> {
        match label.parse::<Key>() {
            Ok(key) => self.press(key),
            Err(e) => {
                warn!("{}", e);
                Ok(KeypadOutcome::Ignored)
            }
        }
    }

    /// Close the keypad without committing (tap outside)
    pub fn dismiss_keypad(&mut self) -> bool {
        self.keypad.dismiss()
    }

    pub fn create_note(&mut self, command: CreateNoteCommand) -> Result<Note, StoreError> {
        let note = self.store.create_note(command)?;
        self.report_save_failure();
        Ok(note)
    }

    pub fn switch_note(&mut self, note_id: &str) -> Result<bool, StoreError> {
        self.keypad.dismiss();
        let switched = self.store.switch_note(note_id)?;
        if switched {
            self.render();
        }
        Ok(switched)
    }

    pub fn delete_note(&mut self, note_id: &str) -> Result<bool, StoreError> {
        self.keypad.dismiss();
        let deleted = self.store.delete_note(note_id)?;
        if deleted {
            self.render();
        }
        Ok(deleted)
    }

    /// Change the active note's visibility settings. An open keypad on a
    /// denomination that becomes hidden is closed.
    pub fn update_settings(&mut self, patch: NoteSettingsPatch) -> Result<bool, StoreError> {
        let note_id = self.store.current_note_id().to_string();
        let updated = self.store.update_note_settings(&note_id, patch)?;
        if updated {
            let note = self.store.current_note();
            let target_hidden = self
                .keypad
                .target()
                .and_then(|target| denomination::find(note.currency, target))
                .map_or(false, |d| d.is_hidden_by(&note.settings));
            if target_hidden {
                self.keypad.dismiss();
            }
            self.render();
        }
        Ok(updated)
    }

    pub fn reset_counts(&mut self) -> Result<(), StoreError> {
        self.keypad.dismiss();
        self.store.reset_counts()?;
        self.render();
        Ok(())
    }

    pub fn save_checkpoint(&mut self, memo: &str) -> Result<Option<SavedPoint>, StoreError> {
        self.store.save_checkpoint(memo)
    }

    /// Put the counts of one of the active note's save points back in place
    pub fn restore_saved_point(&mut self, saved_point_id: &str) -> Result<bool, StoreError> {
        let note = self.store.current_note();
        let Some(point) = note.saved_point(saved_point_id) else {
            warn!("Save point {} not found on note {}", saved_point_id, note.id);
            return Ok(false);
        };
        let note_id = note.id.clone();
        let counts = point.counts.clone();

        self.keypad.dismiss();
        let restored = self.store.restore_counts(&note_id, counts)?;
        if restored {
            self.render();
        }
        Ok(restored)
    }

    pub fn delete_saved_point(&mut self, saved_point_id: &str) -> Result<bool, StoreError> {
        let note_id = self.store.current_note_id().to_string();
        self.store.delete_saved_point(&note_id, saved_point_id)
    }

    /// Snapshot of the active note for export
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot::build(self.store.current_note(), Local::now())
    }

    /// Push the active note to the surface, along with any failed background save
    pub fn render(&mut self) {
        let note = self.store.current_note();
        let summary = self.store.compute_summary(note.currency, &note.counts);
        self.surface
            .show_counts(note.currency, &note.settings, &note.counts, &summary);
        self.report_save_failure();
    }

    /// Show the most recent failed background save on the surface, if any.
    ///
    /// Coalesced writes fail after the edit that caused them returned, so
    /// front ends should also call this between gestures.
    pub fn report_save_failure(&mut self) -> Option<StorageError> {
        let failure = self.store.take_deferred_error()?;
        error!("Background save failed: {}", failure);
        self.surface
            .show_save_error(&format!("保存に失敗しました: {}", failure));
        Some(failure)
    }
}
