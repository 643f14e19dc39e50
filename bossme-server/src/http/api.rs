//! REST API handlers

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};
use bossme_core::{AuthContext, Role};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::require_role;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Number of open push connections
    pub open_connections: usize,
    /// Number of updates held for polling clients
    pub buffered_updates: usize,
}

/// Health check endpoint
///
/// Returns server status, version, uptime and transport counters.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        open_connections: state.connections.open_connections().len(),
        buffered_updates: state.updates.len(),
    })
}

/// DELETE /api/admin/updates - Drop every buffered update
pub async fn clear_updates(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthContext>>,
) -> Result<StatusCode, ApiError> {
    let auth = auth
        .map(|Extension(ctx)| ctx)
        .unwrap_or(AuthContext::Anonymous);
    let admin = require_role(&auth, Role::Admin)?;

    let cleared = state.updates.len();
    state.updates.clear();
    tracing::info!(admin = %admin.user_id, cleared, "Update queue cleared");

    Ok(StatusCode::NO_CONTENT)
}
