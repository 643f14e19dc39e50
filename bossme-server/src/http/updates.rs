//! Polling fallback for clients without a push connection

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use bossme_core::{Timestamp, UpdateEvent};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Message attached to every polling response
pub const POLLING_MESSAGE: &str =
    "Polling fallback: WebSocket unavailable, deliver updates via periodic polling";

/// Query parameters for `GET /updates`
///
/// Read from raw pairs so a bad or repeated `since` degrades to 0 instead of
/// rejecting the request.
#[derive(Debug, Default)]
pub struct UpdatesQuery {
    /// Every `since` value in query-string order
    pub since: Vec<String>,
}

impl UpdatesQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let since = pairs
            .into_iter()
            .filter(|(key, _)| key == "since")
            .map(|(_, value)| value)
            .collect();
        Self { since }
    }

    /// First `since` that parses as a millisecond timestamp, else 0
    pub fn since(&self) -> Timestamp {
        self.since
            .iter()
            .find_map(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Response for `GET /updates`
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatesResponse {
    /// Events recorded after `since`, oldest first
    pub updates: Vec<UpdateEvent>,
    /// Server time; pass back as `since` on the next poll
    pub timestamp: Timestamp,
    pub message: String,
}

/// Return every buffered update newer than `since`
pub async fn poll_updates(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<UpdatesResponse> {
    let since = UpdatesQuery::from_pairs(pairs).since();
    let (updates, cursor) = state.updates.query_with_cursor(since);
    tracing::debug!(since, count = updates.len(), cursor, "Serving poll request");

    Json(UpdatesResponse {
        updates,
        timestamp: cursor,
        message: POLLING_MESSAGE.to_string(),
    })
}
