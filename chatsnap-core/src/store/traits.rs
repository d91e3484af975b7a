//! MessageStore trait

use chrono::{DateTime, Utc};

use super::error::StoreError;
use crate::message::{ChatMessage, StoredMessage};

/// Append-only, timestamp-ordered message persistence
///
/// The store outlives any single capture session and accumulates records
/// across sessions. Insertion order is preserved and is the iteration
/// order of range queries; each insert is assigned a surrogate id.
///
/// Implementations must tolerate one appending session concurrently with
/// range queries from the exporter.
pub trait MessageStore: Send + Sync {
    /// Persist one message, returning its surrogate id.
    fn append(&self, message: &ChatMessage) -> Result<i64, StoreError>;

    /// All messages with `from <= timestamp` (and `timestamp <= to` when an
    /// upper bound is given), in insertion order.
    fn query_range(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<StoredMessage>, StoreError>;
}
