pub mod memory;
pub mod preference;

pub use memory::MemoryPreferenceStore;
pub use preference::{PreferenceStore, SqlitePreferenceStore};
