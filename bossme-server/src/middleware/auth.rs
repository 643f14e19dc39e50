//! Identity middleware for axum
//!
//! The OAuth proxy in front of the server verifies callers and forwards
//! their user id and role as headers. This middleware turns those headers
//! into an [`AuthContext`] request extension.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use bossme_core::{AuthConfig, AuthContext, Identity, Role};

use crate::AppState;
use crate::error::ApiError;

/// Build the auth context for a request from its headers
pub fn resolve_identity(config: &AuthConfig, headers: &HeaderMap) -> AuthContext {
    if !config.trust_proxy_headers {
        return AuthContext::Anonymous;
    }

    let Some(user_id) = headers
        .get(config.user_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return AuthContext::Anonymous;
    };

    let role = headers
        .get(config.role_header.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse)
        .unwrap_or(Role::User);

    AuthContext::Authenticated {
        identity: Identity::new(user_id).with_role(role),
    }
}

/// Attach an [`AuthContext`] to every request
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_context = resolve_identity(&state.auth, request.headers());
    if let Some(identity) = auth_context.identity() {
        tracing::trace!(user = %identity.user_id, role = %identity.role, "Request identity");
    }

    request.extensions_mut().insert(auth_context);
    next.run(request).await
}

/// Require an authenticated caller
pub fn require_identity(auth: &AuthContext) -> Result<&Identity, ApiError> {
    auth.identity().ok_or(ApiError::Unauthorized)
}

/// Require an authenticated caller holding at least `required`
pub fn require_role(auth: &AuthContext, required: Role) -> Result<&Identity, ApiError> {
    let identity = require_identity(auth)?;
    if identity.role.satisfies(required) {
        Ok(identity)
    } else {
        Err(ApiError::Forbidden(required))
    }
}
