//! chatsnap-core: live chat capture and export
//!
//! This crate provides the capture pipeline for chatsnap:
//!
//! - **Chat link** - [`ChatLink`] trait with the anonymous [`TwitchLink`]
//!   and a scripted [`MockLink`] for tests
//! - **Capture session** - [`CaptureSession`] for the
//!   connect -> receive -> disconnect lifecycle
//! - **Local store** - [`MessageStore`] trait with [`MemoryStore`] and
//!   [`SqliteStore`] backends
//! - **Export** - [`Exporter`] producing the time-filtered JSON snapshot
//! - **Remote sink** - [`RemoteSink`] for best-effort forwarding
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatsnap_core::{CaptureSession, MemoryStore, TwitchLinkFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = CaptureSession::new(
//!     Arc::new(TwitchLinkFactory::default()),
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! session.start("somechannel").await?;
//! // ... capture runs until ...
//! if let Some(artifact) = session.stop().await? {
//!     println!("captured {} messages", artifact.messages.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod link;
pub mod message;
pub mod session;
pub mod sink;
pub mod store;

// Re-export key types for convenience
pub use error::{LinkError, SessionError, SnapError};
pub use export::{ExportArtifact, ExportError, Exporter};
pub use link::{
    ChatLink, LinkEvent, LinkFactory, MockLink, MockLinkFactory, MockLinkHandle, TwitchLink,
    TwitchLinkFactory,
};
pub use message::{ChatMessage, StoredMessage, resolve_username, strip_sigil};
pub use session::{CaptureSession, SessionState};
pub use sink::RemoteSink;
pub use store::{MemoryStore, MessageStore, SqliteStore, StoreError};
