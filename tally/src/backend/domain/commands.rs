//! Domain-level command types
//! Inputs to [`NoteService`](super::NoteService) operations that carry more
//! than one or two values.

pub mod notes {
    use shared::Currency;

    use crate::backend::domain::models::NoteSettings;

    /// Input for creating a new note. A blank name gets a numbered default.
    #[derive(Debug, Clone, Default)]
    pub struct CreateNoteCommand {
        pub name: String,
        pub currency: Currency,
        pub settings: NoteSettings,
    }

    impl CreateNoteCommand {
        pub fn new(name: impl Into<String>, currency: Currency) -> Self {
            Self {
                name: name.into(),
                currency,
                settings: NoteSettings::default(),
            }
        }

        pub fn with_settings(mut self, settings: NoteSettings) -> Self {
            self.settings = settings;
            self
        }
    }
}

pub mod history {
    use crate::backend::domain::models::Counts;
    use crate::backend::domain::summary::Summary;

    /// Input for recording a save point on a note.
    #[derive(Debug, Clone)]
    pub struct AddSavedPointCommand {
        pub note_id: String,
        pub memo: String,
        pub counts: Counts,
        pub summary: Summary,
    }
}

pub use history::*;
pub use notes::*;
