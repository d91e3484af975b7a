//! Captured message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One captured chat utterance
///
/// The `timestamp` is stamped by the capturing side at receipt, not taken
/// from the chat service (which provides no reliable client-visible time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Channel the message was captured from, without the leading `#`
    pub channel: String,
    /// Resolved sender name
    pub username: String,
    /// Message body, unmodified
    #[serde(rename = "message")]
    pub text: String,
    /// Receipt instant
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        channel: impl Into<String>,
        username: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            channel: strip_sigil(&channel.into()).to_string(),
            username: username.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// A message together with its store-assigned surrogate id
///
/// The id has no semantic meaning; duplicate text from the same user is a
/// valid, distinct record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    #[serde(flatten)]
    pub message: ChatMessage,
}

/// Resolve a sender name: display-name wins, then login, then "Anonymous".
pub fn resolve_username(display_name: Option<&str>, login: Option<&str>) -> String {
    display_name
        .filter(|s| !s.is_empty())
        .or_else(|| login.filter(|s| !s.is_empty()))
        .unwrap_or("Anonymous")
        .to_string()
}

/// Strip the IRC channel sigil for storage, display, and filenames.
pub fn strip_sigil(channel: &str) -> &str {
    channel.strip_prefix('#').unwrap_or(channel)
}
