//! CaptureSession: one connect -> receive -> disconnect lifecycle
//!
//! The session owns the chat link, forwards every inbound message into the
//! in-memory buffer and the local store, and produces the time-filtered
//! export when stopped. Control transitions (start/stop) serialize on one
//! mutex; message ingestion runs in its own task and only touches the
//! shared views.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::state::SessionState;
use crate::error::SessionError;
use crate::export::{ExportArtifact, ExportError, Exporter};
use crate::link::{ChatLink, LinkEvent, LinkFactory};
use crate::message::{ChatMessage, strip_sigil};
use crate::sink::RemoteSink;
use crate::store::MessageStore;

/// Control-path resources, guarded by the session's single mutex boundary
struct Ctrl {
    link: Option<Box<dyn ChatLink>>,
    ingest: Option<JoinHandle<()>>,
}

/// Views shared between the control path, the ingest task, and observers
struct Shared {
    state: RwLock<SessionState>,
    started_at: RwLock<Option<DateTime<Utc>>>,
    buffer: RwLock<Vec<ChatMessage>>,
    channel: RwLock<Option<String>>,
}

/// One capture lifecycle: start, ingest, stop-and-export
///
/// The buffer is a live cache of what this session has received; the store
/// is the source of truth for the export. A session can be restarted for
/// the same or a different channel after it returns to `Idle`.
pub struct CaptureSession {
    ctrl: Mutex<Ctrl>,
    shared: Arc<Shared>,
    factory: Arc<dyn LinkFactory>,
    store: Arc<dyn MessageStore>,
    sink: Option<Arc<RemoteSink>>,
}

impl CaptureSession {
    pub fn new(factory: Arc<dyn LinkFactory>, store: Arc<dyn MessageStore>) -> Self {
        Self {
            ctrl: Mutex::new(Ctrl {
                link: None,
                ingest: None,
            }),
            shared: Arc::new(Shared {
                state: RwLock::new(SessionState::Idle),
                started_at: RwLock::new(None),
                buffer: RwLock::new(Vec::new()),
                channel: RwLock::new(None),
            }),
            factory,
            store,
            sink: None,
        }
    }

    /// Forward each captured message to a remote endpoint, best effort.
    pub fn with_sink(mut self, sink: RemoteSink) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.shared.state.read().unwrap()
    }

    /// Instant the session became `Active`; `None` otherwise
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.shared.started_at.read().unwrap()
    }

    /// Channel currently being captured, without the sigil
    pub fn channel(&self) -> Option<String> {
        self.shared.channel.read().unwrap().clone()
    }

    /// Snapshot of the messages received so far in this activation
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.buffer.read().unwrap().clone()
    }

    /// Open a link to the channel and begin capturing.
    ///
    /// Errors unless the session is `Idle`. Returns as soon as the link is
    /// opened; the `Connecting -> Active` transition happens when the link
    /// reports its first successful connection.
    pub async fn start(&self, channel: &str) -> Result<(), SessionError> {
        let mut ctrl = self.ctrl.lock().await;

        let state = self.state();
        if state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                expected: "Idle".to_string(),
                actual: format!("{state:?}"),
            });
        }

        // A previous activation that ended in a link failure leaves its
        // closed link and finished ingest task behind; reap them here.
        if let Some(mut link) = ctrl.link.take() {
            link.close().await;
        }
        if let Some(task) = ctrl.ingest.take() {
            let _ = task.await;
        }

        *self.shared.state.write().unwrap() = SessionState::Connecting;
        *self.shared.channel.write().unwrap() = Some(strip_sigil(channel.trim()).to_string());

        let mut link = self.factory.create();
        let events = match link.open(channel).await {
            Ok(events) => events,
            Err(e) => {
                *self.shared.state.write().unwrap() = SessionState::Idle;
                *self.shared.channel.write().unwrap() = None;
                return Err(SessionError::Link(e));
            }
        };
        info!(channel, "capture session connecting");

        ctrl.ingest = Some(tokio::spawn(ingest_loop(
            events,
            Arc::clone(&self.shared),
            Arc::clone(&self.store),
            self.sink.clone(),
        )));
        ctrl.link = Some(link);
        Ok(())
    }

    /// Stop capturing and export the session's snapshot.
    ///
    /// A no-op returning `Ok(None)` when `Idle`; when `Connecting`, the
    /// in-flight connection attempt is cancelled and `Ok(None)` returned.
    /// When `Active`, the link is closed and ingestion fully drained before
    /// the exporter runs, so the artifact holds every message the link
    /// emitted. The session is back to `Idle` afterwards even if the
    /// export itself fails.
    pub async fn stop(&self) -> Result<Option<ExportArtifact>, ExportError> {
        let mut ctrl = self.ctrl.lock().await;

        match self.state() {
            SessionState::Idle | SessionState::Closing => return Ok(None),
            SessionState::Connecting => {
                if let Some(mut link) = ctrl.link.take() {
                    link.close().await;
                }
                if let Some(task) = ctrl.ingest.take() {
                    let _ = task.await;
                }
                self.reset();
                return Ok(None);
            }
            SessionState::Active => {}
        }

        *self.shared.state.write().unwrap() = SessionState::Closing;
        if let Some(mut link) = ctrl.link.take() {
            link.close().await;
        }
        if let Some(task) = ctrl.ingest.take() {
            let _ = task.await;
        }

        let Some(started_at) = self.started_at() else {
            // A link failure raced this stop and already deactivated.
            self.reset();
            return Ok(None);
        };
        let channel = self.channel().unwrap_or_default();

        let result = Exporter::new(Arc::clone(&self.store)).export(&channel, started_at);
        self.reset();
        match &result {
            Ok(artifact) => info!(
                channel,
                messages = artifact.messages.len(),
                "capture session exported"
            ),
            Err(e) => warn!(channel, error = %e, "capture session export failed"),
        }
        result.map(Some)
    }

    fn reset(&self) {
        *self.shared.state.write().unwrap() = SessionState::Idle;
        *self.shared.started_at.write().unwrap() = None;
        *self.shared.channel.write().unwrap() = None;
        self.shared.buffer.write().unwrap().clear();
    }
}

/// Consume link events until the stream ends or the link fails.
///
/// Buffer updates are visible to observers immediately; the store write for
/// each message happens before the next event is taken, so awaiting this
/// task after closing the link drains all pending persistence.
async fn ingest_loop(
    mut events: mpsc::Receiver<LinkEvent>,
    shared: Arc<Shared>,
    store: Arc<dyn MessageStore>,
    sink: Option<Arc<RemoteSink>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Connected => {
                *shared.state.write().unwrap() = SessionState::Active;
                let mut started_at = shared.started_at.write().unwrap();
                if started_at.is_none() {
                    *started_at = Some(Utc::now());
                }
                info!("chat link connected");
            }
            LinkEvent::Message(msg) => {
                if shared.started_at.read().unwrap().is_none() {
                    // Not activated; nothing to attribute the message to.
                    continue;
                }
                shared.buffer.write().unwrap().push(msg.clone());
                if let Err(e) = store.append(&msg) {
                    // Ingestion continues; the message survives in the
                    // buffer for this run but will miss the export.
                    warn!(error = %e, "store write failed");
                }
                if let Some(sink) = &sink {
                    let sink = Arc::clone(sink);
                    tokio::spawn(async move {
                        sink.forward(&msg).await;
                    });
                }
            }
            LinkEvent::Error { message } => {
                warn!(%message, "chat link failed, deactivating session");
                *shared.state.write().unwrap() = SessionState::Idle;
                *shared.started_at.write().unwrap() = None;
                *shared.channel.write().unwrap() = None;
                shared.buffer.write().unwrap().clear();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{MockLink, MockLinkFactory};
    use crate::store::MemoryStore;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    fn session_with(link: MockLink) -> (CaptureSession, Arc<MemoryStore>) {
        let factory = MockLinkFactory::new();
        factory.push(link);
        let store = Arc::new(MemoryStore::new());
        let session = CaptureSession::new(Arc::new(factory), store.clone());
        (session, store)
    }

    #[tokio::test]
    async fn new_session_is_idle() {
        let (session, _) = session_with(MockLink::new());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.started_at().is_none());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn start_transitions_to_active_and_records_start() {
        let (session, _) = session_with(MockLink::new());
        session.start("#chan").await.unwrap();

        wait_until(|| session.state() == SessionState::Active).await;
        assert!(session.started_at().is_some());
        assert_eq!(session.channel().as_deref(), Some("chan"));
    }

    #[tokio::test]
    async fn start_from_non_idle_fails() {
        let (session, _) = session_with(MockLink::new());
        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;

        let result = session.start("#other").await;
        assert!(matches!(result, Err(SessionError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn messages_buffered_in_receipt_order_and_persisted() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, store) = session_with(link);

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;

        handle.say("#chan", "alice", "one").await;
        handle.say("#chan", "bob", "two").await;
        handle.say("#chan", "alice", "three").await;
        wait_until(|| session.messages().len() == 3).await;

        let texts: Vec<_> = session.messages().iter().map(|m| m.text.clone()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn stored_timestamps_are_non_decreasing() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, store) = session_with(link);

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        for i in 0..10 {
            handle.say("#chan", "alice", &format!("m{i}")).await;
        }
        wait_until(|| session.messages().len() == 10).await;

        let records = store
            .query_range(Utc::now() - Duration::hours(1), None)
            .unwrap();
        for pair in records.windows(2) {
            assert!(pair[0].message.timestamp <= pair[1].message.timestamp);
        }
    }

    #[tokio::test]
    async fn stop_exports_and_returns_to_idle() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, _) = session_with(link);

        session.start("#somechannel").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        handle.say("#somechannel", "alice", "hi").await;
        handle.say("#somechannel", "bob", "yo").await;
        wait_until(|| session.messages().len() == 2).await;

        let artifact = session.stop().await.unwrap().unwrap();
        assert_eq!(artifact.filename, "somechannel.json");
        assert_eq!(artifact.messages.len(), 2);
        assert_eq!(artifact.messages[0].message.username, "alice");
        assert_eq!(artifact.messages[1].message.username, "bob");

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.started_at().is_none());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn export_excludes_messages_persisted_before_activation() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, store) = session_with(link);

        // A record left over from an earlier session.
        store
            .append(&ChatMessage::new(
                "chan",
                "oldtimer",
                "ancient",
                Utc::now() - Duration::hours(1),
            ))
            .unwrap();

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        handle.say("#chan", "alice", "fresh").await;
        wait_until(|| session.messages().len() == 1).await;

        let artifact = session.stop().await.unwrap().unwrap();
        assert_eq!(artifact.messages.len(), 1);
        assert_eq!(artifact.messages[0].message.text, "fresh");
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_noop() {
        let (session, _) = session_with(MockLink::new());
        assert!(session.stop().await.unwrap().is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stop_while_connecting_cancels_the_attempt() {
        let link = MockLink::silent();
        let handle = link.handle();
        let (session, _) = session_with(link);

        session.start("#chan").await.unwrap();
        assert_eq!(session.state(), SessionState::Connecting);

        assert!(session.stop().await.unwrap().is_none());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!handle.is_open().await);
    }

    #[tokio::test]
    async fn second_stop_yields_none_not_a_duplicate_export() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, _) = session_with(link);

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        handle.say("#chan", "alice", "hi").await;
        wait_until(|| session.messages().len() == 1).await;

        assert!(session.stop().await.unwrap().is_some());
        assert!(session.stop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_capture_fails_export_but_returns_to_idle() {
        let (session, _) = session_with(MockLink::new());

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;

        let result = session.stop().await;
        assert!(matches!(result, Err(ExportError::Empty)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn link_failure_deactivates_the_session() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, store) = session_with(link);

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        handle.say("#chan", "alice", "hi").await;
        wait_until(|| session.messages().len() == 1).await;

        handle
            .emit(LinkEvent::Error {
                message: "connection dropped".to_string(),
            })
            .await;
        wait_until(|| session.state() == SessionState::Idle).await;

        assert!(session.messages().is_empty());
        assert!(session.started_at().is_none());
        // The store keeps what was already persisted.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn session_can_be_restarted_after_stop() {
        let factory = MockLinkFactory::new();
        let first = MockLink::new();
        let first_handle = first.handle();
        let second = MockLink::new();
        let second_handle = second.handle();
        factory.push(first);
        factory.push(second);

        let store = Arc::new(MemoryStore::new());
        let session = CaptureSession::new(Arc::new(factory), store.clone());

        session.start("#one").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        first_handle.say("#one", "alice", "a").await;
        wait_until(|| session.messages().len() == 1).await;
        session.stop().await.unwrap();

        session.start("#two").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;
        second_handle.say("#two", "bob", "b").await;
        wait_until(|| session.messages().len() == 1).await;

        let artifact = session.stop().await.unwrap().unwrap();
        // Second export is filtered by the second activation's start.
        assert_eq!(artifact.messages.len(), 1);
        assert_eq!(artifact.filename, "two.json");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn stop_drains_messages_emitted_just_before_close() {
        let link = MockLink::new();
        let handle = link.handle();
        let (session, _) = session_with(link);

        session.start("#chan").await.unwrap();
        wait_until(|| session.state() == SessionState::Active).await;

        // Inject a burst and stop immediately, without waiting for the
        // ingest task to catch up.
        for i in 0..20 {
            handle.say("#chan", "alice", &format!("m{i}")).await;
        }
        let artifact = session.stop().await.unwrap().unwrap();
        assert_eq!(artifact.messages.len(), 20);
    }
}
