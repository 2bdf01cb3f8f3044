//! # Kinshu Tally
//!
//! Cash denomination tally engine: keypad arithmetic, per-note counts in JPY
//! or CNY, bill/coin summaries, bounded save-point history, backups and
//! summary export. Rendering is left to the embedding UI, which only needs to
//! implement [`CellSurface`].

pub mod backend;

pub use backend::config::TallyConfig;
pub use backend::domain::{
    evaluate, export_in_background, AddSavedPointCommand, BackupError, BackupService,
    CreateNoteCommand, Denomination, ExportError, ExportSnapshot, ImportOutcome, Key, Keypad,
    KeypadOutcome, Note, NoteService, NoteSettings, NoteSettingsPatch, Operator, SavedPoint,
    StoreError, Summary, SummaryExporter, TallySession,
};
pub use backend::io::{CellSurface, CsvSummaryExporter, HeadlessSurface};
pub use backend::storage::{
    FileStorage, KeyValueStorage, MemoryStorage, Preferences, PreferencesRepository, StorageError,
};
pub use backend::{initialize_backend, AppState};
pub use shared::Currency;
