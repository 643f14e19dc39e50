//! bossme-core: core library for bossme.me realtime updates
//!
//! This crate provides the pieces the server wires together:
//!
//! - **Update queue** - [`UpdateQueue`], a bounded ring buffer of recent
//!   [`UpdateEvent`]s that polling clients read with "everything since T"
//! - **Event types** - [`EventKind`] and [`UpdateEvent`] for the wire contract
//! - **Meme domain** - [`Meme`], [`MemeStore`] and [`InMemoryMemeStore`] for
//!   submissions, moderation and votes
//! - **Auth** - [`AuthContext`] and [`Role`] describing the identity forwarded
//!   by the OAuth proxy
//!
//! # Quick Start
//!
//! ```
//! use bossme_core::{EventKind, UpdateQueue};
//! use serde_json::json;
//!
//! let queue = UpdateQueue::new(100);
//! let recorded = queue.record(EventKind::NewMeme, json!({"id": "m1"}));
//!
//! let updates = queue.query(recorded.timestamp - 1);
//! assert_eq!(updates.len(), 1);
//! assert!(queue.query(recorded.timestamp).is_empty());
//! ```

pub mod auth;
pub mod error;
pub mod events;
pub mod memes;

// Re-export key types for convenience
pub use auth::{AuthConfig, AuthContext, Identity, Role};
pub use error::{BossmeError, MemeError};
pub use events::{
    Clock, DEFAULT_QUEUE_CAPACITY, EventKind, ManualClock, SystemClock, Timestamp, UpdateEvent,
    UpdateQueue,
};
pub use memes::{InMemoryMemeStore, Meme, MemeStatus, MemeStore, NewMeme, VoteDirection, VoteOutcome};
