//! HTTP server module

mod api;
mod memes;
mod updates;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::middleware::identity_middleware;
use crate::state::DEFAULT_PUSH_PATH;
use crate::ws::ws_handler;
use crate::AppState;

pub use api::HealthResponse;
pub use memes::{ListMemesQuery, MemeView, VoteRequest};
pub use updates::{POLLING_MESSAGE, UpdatesQuery, UpdatesResponse};

/// Routes the push transport may not shadow
const RESERVED_PATHS: &[&str] = &["/updates", "/api"];

/// Check that `path` can host the WebSocket route
pub fn validate_push_path(path: &str) -> Result<(), ServerError> {
    if !path.starts_with('/') || path.len() < 2 {
        return Err(ServerError::InvalidConfig(format!(
            "push path must start with '/' and name a route: {:?}",
            path
        )));
    }
    if path.contains([':', '*', '{', '}']) {
        return Err(ServerError::InvalidConfig(format!(
            "push path must not contain parameters: {:?}",
            path
        )));
    }
    if RESERVED_PATHS
        .iter()
        .any(|reserved| path == *reserved || path.starts_with(&format!("{}/", reserved)))
    {
        return Err(ServerError::InvalidConfig(format!(
            "push path {:?} collides with an HTTP route",
            path
        )));
    }
    Ok(())
}

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let push_path = match validate_push_path(&state.push.path) {
        Ok(()) => state.push.path.clone(),
        Err(e) => {
            tracing::warn!("{}; serving push transport at {}", e, DEFAULT_PUSH_PATH);
            DEFAULT_PUSH_PATH.to_string()
        }
    };

    Router::new()
        .route(&push_path, get(ws_handler))
        .route("/updates", get(updates::poll_updates))
        .route("/api/updates", get(updates::poll_updates))
        .route("/api/health", get(api::health))
        .route("/api/admin/updates", delete(api::clear_updates))
        .route("/api/memes", get(memes::list_memes).post(memes::create_meme))
        .route(
            "/api/memes/:id",
            get(memes::get_meme).delete(memes::delete_meme),
        )
        .route("/api/memes/:id/approve", post(memes::approve_meme))
        .route("/api/memes/:id/reject", post(memes::reject_meme))
        .route("/api/memes/:id/vote", post(memes::vote_meme))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestRequest;
    use bossme_core::Role;
    use bossme_core::auth::{DEFAULT_ROLE_HEADER, DEFAULT_USER_HEADER};

    /// Attach the identity headers the OAuth proxy would forward
    pub trait AsUser {
        fn as_user(self, user_id: &str, role: Role) -> Self;
    }

    impl AsUser for TestRequest {
        fn as_user(self, user_id: &str, role: Role) -> Self {
            self.add_header(
                HeaderName::from_static(DEFAULT_USER_HEADER),
                HeaderValue::from_str(user_id).unwrap(),
            )
            .add_header(
                HeaderName::from_static(DEFAULT_ROLE_HEADER),
                HeaderValue::from_static(role.as_str()),
            )
        }
    }
}
