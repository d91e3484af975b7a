//! Shared application state for the chatsnap server

use std::sync::Arc;

use chatsnap_core::MessageStore;
use chrono::{DateTime, Utc};

/// Shared state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The message store served over HTTP
    pub store: Arc<dyn MessageStore>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
