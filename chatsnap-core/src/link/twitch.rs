//! Anonymous Twitch chat link over WebSocket
//!
//! Connects to the public chat edge as an anonymous `justinfan` client,
//! joins one channel, and emits normalized [`ChatMessage`]s. No credentials
//! are involved; the link is read-only.

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::irc::{self, IrcLine};
use super::traits::{ChatLink, LinkEvent, LinkFactory};
use crate::error::LinkError;
use crate::message::{ChatMessage, resolve_username};

/// Public Twitch chat WebSocket endpoint
pub const TWITCH_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Capacity of the event channel between the socket reader and the session.
/// Messages back up here while a slow store write is in progress, so the
/// reader never stalls on persistence.
const EVENT_BUFFER: usize = 256;

/// ChatLink implementation for Twitch chat
pub struct TwitchLink {
    url: String,
    nick: String,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl TwitchLink {
    /// Create a link against the public chat edge
    pub fn new() -> Self {
        Self::with_url(TWITCH_WS_URL)
    }

    /// Create a link against a custom endpoint (for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            nick: anonymous_nick(),
            cancel: None,
            task: None,
        }
    }

    /// The anonymous nick this link connects as
    pub fn nick(&self) -> &str {
        &self.nick
    }
}

impl Default for TwitchLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatLink for TwitchLink {
    async fn open(&mut self, channel: &str) -> Result<mpsc::Receiver<LinkEvent>, LinkError> {
        if self.cancel.is_some() {
            return Err(LinkError::AlreadyOpen);
        }
        let name = channel.trim().trim_start_matches('#');
        if name.is_empty() {
            return Err(LinkError::InvalidChannel(channel.to_string()));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_connection(
            self.url.clone(),
            self.nick.clone(),
            format!("#{}", name.to_lowercase()),
            tx,
            cancel.clone(),
        ));
        self.cancel = Some(cancel);
        self.task = Some(task);
        Ok(rx)
    }

    async fn close(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Factory producing fresh Twitch links
pub struct TwitchLinkFactory {
    url: String,
}

impl TwitchLinkFactory {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for TwitchLinkFactory {
    fn default() -> Self {
        Self::new(TWITCH_WS_URL)
    }
}

impl LinkFactory for TwitchLinkFactory {
    fn create(&self) -> Box<dyn ChatLink> {
        Box::new(TwitchLink::with_url(self.url.clone()))
    }
}

/// Connect, handshake, and pump protocol lines until cancelled or the
/// transport fails. Owns the socket end to end.
async fn run_connection(
    url: String,
    nick: String,
    wire_channel: String,
    tx: mpsc::Sender<LinkEvent>,
    cancel: CancellationToken,
) {
    let ws = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect_async(&url) => match result {
            Ok((ws, _response)) => ws,
            Err(e) => {
                let _ = tx
                    .send(LinkEvent::Error {
                        message: format!("connection failed: {e}"),
                    })
                    .await;
                return;
            }
        },
    };

    let (mut sink, mut stream) = ws.split();

    // Request tags before identifying, then join after the 001 welcome.
    for line in [
        "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
        format!("NICK {nick}"),
    ] {
        if sink.send(Message::Text(line.into())).await.is_err() {
            let _ = tx
                .send(LinkEvent::Error {
                    message: "connection closed during handshake".to_string(),
                })
                .await;
            return;
        }
    }

    let mut last_stamp = Utc::now();
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                // The server may batch several protocol lines per frame.
                for raw in text.as_str().lines() {
                    let Some(line) = irc::parse_line(raw) else {
                        continue;
                    };
                    match line.command.as_str() {
                        "PING" => {
                            let pong = match &line.trailing {
                                Some(t) => format!("PONG :{t}"),
                                None => "PONG".to_string(),
                            };
                            if sink.send(Message::Text(pong.into())).await.is_err() {
                                let _ = tx
                                    .send(LinkEvent::Error {
                                        message: "connection closed".to_string(),
                                    })
                                    .await;
                                return;
                            }
                        }
                        "001" => {
                            debug!(nick = %nick, "welcomed, joining {wire_channel}");
                            if sink
                                .send(Message::Text(format!("JOIN {wire_channel}").into()))
                                .await
                                .is_err()
                            {
                                let _ = tx
                                    .send(LinkEvent::Error {
                                        message: "connection closed before join".to_string(),
                                    })
                                    .await;
                                return;
                            }
                            if tx.send(LinkEvent::Connected).await.is_err() {
                                return;
                            }
                        }
                        "PRIVMSG" => {
                            if let Some(msg) = normalize_privmsg(&line, &nick, &mut last_stamp) {
                                if tx.send(LinkEvent::Message(msg)).await.is_err() {
                                    // Receiver dropped; the session is gone.
                                    return;
                                }
                            }
                        }
                        "RECONNECT" => {
                            // The edge is about to drop us; no auto-reconnect.
                            let _ = tx
                                .send(LinkEvent::Error {
                                    message: "server requested reconnect".to_string(),
                                })
                                .await;
                            return;
                        }
                        _ => {}
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                let _ = tx
                    .send(LinkEvent::Error {
                        message: "connection closed by server".to_string(),
                    })
                    .await;
                return;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "websocket error");
                let _ = tx
                    .send(LinkEvent::Error {
                        message: format!("transport error: {e}"),
                    })
                    .await;
                return;
            }
        }
    }
}

/// Normalize a PRIVMSG into a [`ChatMessage`].
///
/// Returns `None` for loopback echoes (messages authored by the capturing
/// nick) and structurally incomplete lines. The receipt stamp is clamped
/// to be non-decreasing across the link's lifetime.
fn normalize_privmsg(
    line: &IrcLine,
    self_nick: &str,
    last_stamp: &mut DateTime<Utc>,
) -> Option<ChatMessage> {
    let login = line.prefix.as_deref().and_then(irc::login_from_prefix);
    if login.is_some_and(|l| l.eq_ignore_ascii_case(self_nick)) {
        return None;
    }

    let channel = line.params.first()?;
    let text = line.trailing.as_deref()?;
    let username = resolve_username(line.tag("display-name"), login);

    let stamp = Utc::now().max(*last_stamp);
    *last_stamp = stamp;

    Some(ChatMessage::new(channel.clone(), username, text, stamp))
}

fn anonymous_nick() -> String {
    // Twitch accepts any justinfan<digits> nick without authentication.
    let digits = uuid::Uuid::new_v4().as_u128() % 1_000_000;
    format!("justinfan{digits}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn privmsg(raw: &str) -> IrcLine {
        irc::parse_line(raw).unwrap()
    }

    #[test]
    fn normalizes_message_with_display_name() {
        let line = privmsg(
            "@display-name=Alice :alice!alice@alice.tmi.twitch.tv PRIVMSG #chan :hello",
        );
        let mut last = Utc::now() - Duration::seconds(1);
        let msg = normalize_privmsg(&line, "justinfan1", &mut last).unwrap();

        assert_eq!(msg.channel, "chan");
        assert_eq!(msg.username, "Alice");
        assert_eq!(msg.text, "hello");
    }

    #[test]
    fn falls_back_to_login_then_anonymous() {
        let line = privmsg(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :yo");
        let mut last = Utc::now();
        let msg = normalize_privmsg(&line, "justinfan1", &mut last).unwrap();
        assert_eq!(msg.username, "bob");

        let line = privmsg("PRIVMSG #chan :ghost");
        let msg = normalize_privmsg(&line, "justinfan1", &mut last).unwrap();
        assert_eq!(msg.username, "Anonymous");
    }

    #[test]
    fn loopback_echo_is_dropped() {
        let line =
            privmsg(":justinfan1!justinfan1@justinfan1.tmi.twitch.tv PRIVMSG #chan :echo");
        let mut last = Utc::now();
        assert!(normalize_privmsg(&line, "justinfan1", &mut last).is_none());
        assert!(normalize_privmsg(&line, "JustinFan1", &mut last).is_none());
    }

    #[test]
    fn receipt_stamp_is_monotonic() {
        let line = privmsg(":a!a@a PRIVMSG #chan :x");
        let future = Utc::now() + Duration::seconds(60);
        let mut last = future;
        let msg = normalize_privmsg(&line, "justinfan1", &mut last).unwrap();

        // Clock is behind `last`; the stamp must not move backwards.
        assert_eq!(msg.timestamp, future);
        assert_eq!(last, future);
    }

    #[test]
    fn line_without_body_is_skipped() {
        let line = privmsg(":a!a@a PRIVMSG #chan");
        let mut last = Utc::now();
        assert!(normalize_privmsg(&line, "justinfan1", &mut last).is_none());
    }

    #[test]
    fn anonymous_nick_shape() {
        let nick = anonymous_nick();
        assert!(nick.starts_with("justinfan"));
        assert!(nick["justinfan".len()..].chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn open_rejects_empty_channel() {
        let mut link = TwitchLink::new();
        assert!(matches!(
            link.open("  #  ").await,
            Err(LinkError::InvalidChannel(_))
        ));
    }

    #[tokio::test]
    async fn close_before_open_is_safe() {
        let mut link = TwitchLink::new();
        link.close().await;
        link.close().await;
    }
}
