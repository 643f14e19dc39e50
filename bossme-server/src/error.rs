//! Server error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bossme_core::{MemeError, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in the bossme server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected at startup
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// No identity was forwarded with the request
    #[error("authentication required")]
    Unauthorized,

    /// The caller's role is not high enough
    #[error("requires {0} role")]
    Forbidden(Role),

    /// Request rejected before reaching the domain
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Meme(#[from] MemeError),
}

/// JSON body of an error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Meme(e) => match e {
                MemeError::NotFound(_) => StatusCode::NOT_FOUND,
                MemeError::Validation(_) => StatusCode::BAD_REQUEST,
                MemeError::NotPublished(_)
                | MemeError::InvalidTransition { .. }
                | MemeError::Conflict(_) => StatusCode::CONFLICT,
            },
        }
    }

    /// Stable machine readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::Meme(e) => match e {
                MemeError::NotFound(_) => "not_found",
                MemeError::Validation(_) => "validation",
                MemeError::NotPublished(_) => "not_published",
                MemeError::InvalidTransition { .. } => "invalid_transition",
                MemeError::Conflict(_) => "conflict",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
