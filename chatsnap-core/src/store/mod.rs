//! Local store: append-only, timestamp-ordered message persistence

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::MessageStore;
