pub mod capture;
pub mod export;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chatsnap_core::{MemoryStore, MessageStore, SqliteStore};

/// Store selection shared by the subcommands: SQLite when a path is given,
/// otherwise ephemeral in-memory.
pub fn open_store(db: Option<&Path>) -> Result<Arc<dyn MessageStore>> {
    Ok(match db {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    })
}
