//! Optional remote sink: best-effort forwarding of captured messages

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::message::ChatMessage;

/// Forwards each captured message to a remote HTTP endpoint
///
/// Delivery is best effort: the endpoint is expected to answer
/// `201 Created`, and anything else is logged and dropped. Sink failures
/// never affect capture.
pub struct RemoteSink {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one message as JSON. Never fails the caller.
    pub async fn forward(&self, message: &ChatMessage) {
        match self.client.post(&self.endpoint).json(message).send().await {
            Ok(response) if response.status() == StatusCode::CREATED => {
                debug!(endpoint = %self.endpoint, "message forwarded");
            }
            Ok(response) => {
                warn!(
                    endpoint = %self.endpoint,
                    status = %response.status(),
                    "remote sink rejected message"
                );
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "remote sink unreachable");
            }
        }
    }
}
