pub mod note;

pub use note::{Note, NoteInput, MAX_TITLE_LEN};
