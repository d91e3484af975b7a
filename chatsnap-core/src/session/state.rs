//! Capture session states

use serde::{Deserialize, Serialize};

/// State of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No link open; ready to start
    Idle,
    /// Link opened, waiting for the connection to establish
    Connecting,
    /// Subscribed and capturing
    Active,
    /// Stop in progress: draining ingestion and exporting
    Closing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_roundtrip() {
        for state in [
            SessionState::Idle,
            SessionState::Connecting,
            SessionState::Active,
            SessionState::Closing,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            let parsed: SessionState = serde_json::from_str(&json).unwrap();
            assert_eq!(state, parsed);
        }
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionState::Connecting).unwrap(),
            "\"connecting\""
        );
    }
}
