//! In-memory MessageStore implementation
//!
//! Ephemeral backend for capture runs that only need the terminal export.
//! Thread-safe via RwLock and an atomic id counter.

use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use super::error::StoreError;
use super::traits::MessageStore;
use crate::message::{ChatMessage, StoredMessage};

/// In-memory implementation of MessageStore
pub struct MemoryStore {
    records: RwLock<Vec<StoredMessage>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryStore {
    fn append(&self, message: &ChatMessage) -> Result<i64, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records.write().unwrap().push(StoredMessage {
            id,
            message: message.clone(),
        });
        Ok(id)
    }

    fn query_range(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| {
                r.message.timestamp >= from && to.is_none_or(|t| r.message.timestamp <= t)
            })
            .cloned()
            .collect())
    }
}
