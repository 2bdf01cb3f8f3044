//! # Domain Module
//!
//! Contains all business logic for the tally application, independent of any
//! UI or storage backend.
//!
//! ## Module Organization
//!
//! - **expression**: keypad arithmetic over exact decimals
//! - **keypad**: the Idle/Editing keypad state machine
//! - **models**: denominations, notes and save points
//! - **summary**: totals and bill/coin counts
//! - **note_service**: the note store and its persistence policy
//! - **session**: store + keypad + view, the entry point for user gestures
//! - **export_service**: export snapshots and background export
//! - **backup_service**: whole-document backup and import
//! - **commands**: inputs for store operations
//!
//! ## Business Rules
//!
//! - There is always at least one note, and exactly one is active
//! - Counts only change when a keypad entry is committed with `Enter`
//! - A note's counts only reference denominations of its own currency
//! - Each note keeps at most a fixed number of save points, newest first
//! - JPY notes can hide the 2000 yen note, all bills or all coins; CNY notes
//!   always show everything

pub mod backup_service;
pub mod commands;
pub mod export_service;
pub mod expression;
pub mod keypad;
pub mod models;
pub mod note_service;
pub mod session;
pub mod summary;

pub use backup_service::{BackupError, BackupPreview, BackupService, ImportOutcome};
pub use commands::*;
pub use export_service::{
    export_in_background, ExportError, ExportRow, ExportSnapshot, SummaryExporter,
};
pub use expression::{evaluate, evaluate_decimal, ExpressionError};
pub use keypad::{Key, Keypad, KeypadOutcome, KeypadState, Operator};
pub use models::{Counts, Denomination, Note, NoteSettings, NoteSettingsPatch, SavedPoint};
pub use note_service::{NoteService, StoreError};
pub use session::TallySession;
pub use summary::{compute_summary, Summary};
