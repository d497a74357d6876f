pub mod collection;
pub mod record;
pub mod utils;

// Re-export handler functions for use in routing
pub use collection::create as notes_post;
pub use collection::list as notes_get;
pub use collection::search as notes_search;

pub use record::delete as note_delete;
pub use record::get as note_get;
pub use record::put as note_put;
