pub mod denomination;
pub mod note;
pub mod saved_point;

pub use denomination::Denomination;
pub use note::{Counts, Note, NoteSettings, NoteSettingsPatch};
pub use saved_point::SavedPoint;
