//! chatsnap-server - HTTP endpoints for the chatsnap message store
//!
//! Exposes the `MessageStore` over HTTP: a `POST` sink accepting captured
//! messages and a `GET` query endpoint filtered by start time. This is the
//! remote leg of the store; capture itself lives in chatsnap-core.

mod http;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

pub use http::{ErrorResponse, HealthResponse, ListMessagesQuery, create_router};
pub use state::AppState;

/// Errors from running the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bind and serve the router until the task is cancelled.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), ServerError> {
    let router = create_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(%addr, "chatsnap server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
