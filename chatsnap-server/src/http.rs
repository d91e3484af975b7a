//! HTTP routes for the remote message store

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chatsnap_core::{ChatMessage, StoredMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::state::AppState;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/messages", post(store_message).get(list_messages))
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: i64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Json<Self> {
        Json(Self {
            error: error.into(),
            code: code.into(),
        })
    }
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
    })
}

/// POST /api/messages
///
/// Persists one message and answers `201 Created` with the stored record.
async fn store_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ChatMessage>,
) -> impl IntoResponse {
    match state.store.append(&message) {
        Ok(id) => (StatusCode::CREATED, Json(StoredMessage { id, message })).into_response(),
        Err(e) => {
            error!(error = %e, "failed to store message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Error storing message", "store_failed"),
            )
                .into_response()
        }
    }
}

/// Query params for message listing
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
}

/// GET /api/messages?startTime=<ISO-8601>
///
/// Returns the ordered records with `timestamp >= startTime`.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListMessagesQuery>,
) -> impl IntoResponse {
    let Some(raw) = query.start_time else {
        return (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Start time is required", "missing_start_time"),
        )
            .into_response();
    };
    let Ok(from) = raw.parse::<DateTime<Utc>>() else {
        return (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                format!("Invalid startTime: {raw:?}"),
                "invalid_start_time",
            ),
        )
            .into_response();
    };

    match state.store.query_range(from, None) {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            error!(error = %e, "failed to query messages");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Error fetching messages", "query_failed"),
            )
                .into_response()
        }
    }
}
