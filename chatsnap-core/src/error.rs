//! Error types for chatsnap-core

use thiserror::Error;

use crate::export::ExportError;
use crate::store::StoreError;

/// Top-level error type for chatsnap-core
#[derive(Error, Debug)]
pub enum SnapError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors related to the capture session lifecycle
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

/// Errors from chat links
///
/// Transport failures during an established subscription are reported as
/// `LinkEvent::Error` on the stream, not through this type.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Link is already open")]
    AlreadyOpen,

    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),
}
