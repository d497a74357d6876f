pub mod manager;
pub mod models;
pub mod notes;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{Note, NoteInput};
pub use notes::{NoteError, NoteStore, PgNoteStore};
