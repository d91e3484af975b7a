//! ChatLink trait and related types
//!
//! The link abstraction separates the capture pipeline from the transport:
//! the real Twitch link and the scripted mock implement the same contract.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::LinkError;
use crate::message::ChatMessage;

/// Events emitted by a chat link
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Subscription established; messages follow
    Connected,
    /// One normalized inbound message, in receipt order
    Message(ChatMessage),
    /// Terminal transport failure; no further events are emitted
    Error { message: String },
}

/// Trait for chat service subscriptions
///
/// A link covers exactly one channel. Connection establishment is
/// concurrent: `open` returns the event stream immediately and reports
/// connect progress or failure through it.
#[async_trait]
pub trait ChatLink: Send + Sync {
    /// Open a subscription to the given channel.
    ///
    /// Transport-level connection failures arrive as [`LinkEvent::Error`]
    /// on the returned stream, never as a synchronous error here. The link
    /// does not reconnect on its own.
    async fn open(&mut self, channel: &str) -> Result<mpsc::Receiver<LinkEvent>, LinkError>;

    /// Terminate the subscription.
    ///
    /// Idempotent; safe to call on an already-closed or never-opened link.
    /// Cancels an in-flight connection attempt.
    async fn close(&mut self);
}

/// Factory for creating chat links
///
/// Enables dependency injection of link implementations into sessions.
pub trait LinkFactory: Send + Sync {
    /// Create a new, unopened link
    fn create(&self) -> Box<dyn ChatLink>;
}
