pub mod note_mapper;

pub use note_mapper::NoteMapper;
