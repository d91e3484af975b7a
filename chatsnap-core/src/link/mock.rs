//! Mock chat link for testing
//!
//! MockLink allows scripting inbound traffic for unit tests: queue events
//! before `open`, or inject them live through a [`MockLinkHandle`] while a
//! session is running.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, mpsc};

use super::traits::{ChatLink, LinkEvent, LinkFactory};
use crate::error::LinkError;
use crate::message::ChatMessage;

const EVENT_BUFFER: usize = 256;

/// Scripted implementation of ChatLink for testing
///
/// By default `open` emits [`LinkEvent::Connected`] followed by any queued
/// events. Build with [`MockLink::silent`] to suppress the connect event
/// and hold the link in its connecting phase.
pub struct MockLink {
    queued: VecDeque<LinkEvent>,
    auto_connect: bool,
    shared: MockLinkHandle,
}

/// Clonable handle for injecting events into an opened [`MockLink`]
#[derive(Clone, Default)]
pub struct MockLinkHandle {
    tx: Arc<Mutex<Option<mpsc::Sender<LinkEvent>>>>,
}

impl MockLinkHandle {
    /// Inject an event; silently dropped if the link is closed.
    pub async fn emit(&self, event: LinkEvent) {
        let guard = self.tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(event).await;
        }
    }

    /// Inject a chat message stamped now.
    pub async fn say(&self, channel: &str, username: &str, text: &str) {
        self.emit(LinkEvent::Message(ChatMessage::new(
            channel,
            username,
            text,
            Utc::now(),
        )))
        .await;
    }

    /// Whether the link currently has an open event stream.
    pub async fn is_open(&self) -> bool {
        self.tx.lock().await.is_some()
    }
}

impl MockLink {
    /// Create a link that connects immediately on `open`
    pub fn new() -> Self {
        Self {
            queued: VecDeque::new(),
            auto_connect: true,
            shared: MockLinkHandle::default(),
        }
    }

    /// Create a link that never reports Connected on its own
    pub fn silent() -> Self {
        Self {
            queued: VecDeque::new(),
            auto_connect: false,
            shared: MockLinkHandle::default(),
        }
    }

    /// Handle for injecting events after the link has been boxed away
    pub fn handle(&self) -> MockLinkHandle {
        self.shared.clone()
    }

    /// Queue an event to be emitted right after `open`
    pub fn queue_event(&mut self, event: LinkEvent) {
        self.queued.push_back(event);
    }

    /// Queue a message to be emitted right after `open`
    pub fn queue_message(&mut self, channel: &str, username: &str, text: &str) {
        self.queue_event(LinkEvent::Message(ChatMessage::new(
            channel,
            username,
            text,
            Utc::now(),
        )));
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatLink for MockLink {
    async fn open(&mut self, _channel: &str) -> Result<mpsc::Receiver<LinkEvent>, LinkError> {
        let mut guard = self.shared.tx.lock().await;
        if guard.is_some() {
            return Err(LinkError::AlreadyOpen);
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        if self.auto_connect {
            let _ = tx.send(LinkEvent::Connected).await;
        }
        for event in self.queued.drain(..) {
            let _ = tx.send(event).await;
        }
        *guard = Some(tx);
        Ok(rx)
    }

    async fn close(&mut self) {
        // Dropping the sender ends the event stream, which is what signals
        // the ingest side that the drain is complete.
        self.shared.tx.lock().await.take();
    }
}

/// Factory that hands out pre-built mock links
///
/// Push prepared links with [`MockLinkFactory::push`]; `create` pops them
/// in order and falls back to a fresh auto-connecting link when empty.
#[derive(Default)]
pub struct MockLinkFactory {
    links: std::sync::Mutex<VecDeque<MockLink>>,
}

impl MockLinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, link: MockLink) {
        self.links.lock().unwrap().push_back(link);
    }
}

impl LinkFactory for MockLinkFactory {
    fn create(&self) -> Box<dyn ChatLink> {
        let link = self
            .links
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Box::new(link)
    }
}
