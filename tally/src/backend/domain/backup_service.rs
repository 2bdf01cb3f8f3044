//! Whole-document backups.
//!
//! A backup is the persisted notes document written to a dated JSON file.
//! Importing one replaces every note, so the caller gets a preview and has to
//! confirm before anything is overwritten.

use chrono::{Local, NaiveDate};
use log::{info, warn};
use shared::NotesDocument;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::backend::domain::note_service::{NoteService, StoreError};
use crate::backend::io::mappers::NoteMapper;

pub const BACKUP_FILE_PREFIX: &str = "kinshu_backup_";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Backup has an invalid shape: {0}")]
    InvalidShape(String),

    #[error("Failed to store backup: {0}")]
    Storage(#[from] StoreError),
}

/// What an import would bring in
#[derive(Debug, Clone, PartialEq)]
pub struct BackupPreview {
    pub note_count: usize,
    pub note_names: Vec<String>,
    pub current_note_id: Option<String>,
    /// File content exactly as read
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { note_count: usize },
    Declined,
}

/// `kinshu_backup_YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{}{}.json", BACKUP_FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// Service for exporting and importing note backups
#[derive(Clone, Default)]
pub struct BackupService {}

impl BackupService {
    pub fn new() -> Self {
        Self {}
    }

    /// Write every note into `directory`, flushing pending edits first
    pub fn export_backup(
        &self,
        store: &mut NoteService,
        directory: &Path,
    ) -> Result<PathBuf, BackupError> {
        store.flush_now()?;
        fs::create_dir_all(directory)?;

        let path = directory.join(backup_file_name(Local::now().date_naive()));
        let json = store.document_json_pretty()?;
        fs::write(&path, json)?;

        info!(
            "Backed up {} note(s) to {}",
            store.notes().len(),
            path.display()
        );
        Ok(path)
    }

    /// Read and validate a backup without touching the store
    pub fn inspect_backup(&self, path: &Path) -> Result<BackupPreview, BackupError> {
        let raw = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        if !value.get("notes").map_or(false, |notes| notes.is_array()) {
            return Err(BackupError::InvalidShape(
                "'notes' must be a list".to_string(),
            ));
        }

        let document: NotesDocument = serde_json::from_value(value)
            .map_err(|e| BackupError::InvalidShape(e.to_string()))?;
        let note_names = document.notes.iter().map(|n| n.name.clone()).collect();
        let current_note_id = document.current_note_id.clone();
        let (_, notes) = NoteMapper::document_to_domain(document)
            .map_err(|e| BackupError::InvalidShape(format!("{:#}", e)))?;

        Ok(BackupPreview {
            note_count: notes.len(),
            note_names,
            current_note_id,
            raw,
        })
    }

    /// Replace every note with the backup at `path` if `confirm` agrees
    pub fn import_backup<F>(
        &self,
        store: &mut NoteService,
        path: &Path,
        confirm: F,
    ) -> Result<ImportOutcome, BackupError>
    where
        F: FnOnce(&BackupPreview) -> bool,
    {
        let preview = self.inspect_backup(path)?;

        if !confirm(&preview) {
            info!("Import of {} declined", path.display());
            return Ok(ImportOutcome::Declined);
        }

        store.import_raw_document(&preview.raw)?;
        if preview.note_count == 0 {
            warn!("Imported backup has no notes, a default note was created");
        }
        info!(
            "Imported {} note(s) from {}",
            preview.note_count,
            path.display()
        );
        Ok(ImportOutcome::Imported {
            note_count: preview.note_count,
        })
    }
}
