//! Error types for bossme-core

use thiserror::Error;

/// Top-level error type for bossme-core
#[derive(Error, Debug)]
pub enum BossmeError {
    #[error("Meme error: {0}")]
    Meme(#[from] MemeError),
}

/// Errors from the meme domain
#[derive(Error, Debug)]
pub enum MemeError {
    #[error("Meme not found: {0}")]
    NotFound(String),

    #[error("Meme is not published: {0}")]
    NotPublished(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid meme: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}
