//! Meme storage
//!
//! The [`MemeStore`] trait is the seam between HTTP handlers and
//! persistence. [`InMemoryMemeStore`] keeps everything in process memory.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{Meme, MemeStatus, VoteDirection};
use crate::error::MemeError;

/// Result of applying a vote
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// The meme after the vote
    pub meme: Meme,
    /// Whether the tally changed
    pub changed: bool,
}

/// Storage for memes and per-user votes
#[async_trait]
pub trait MemeStore: Send + Sync {
    /// Store a new meme
    async fn insert(&self, meme: Meme) -> Result<Meme, MemeError>;

    /// Fetch a meme by id
    async fn get(&self, id: Uuid) -> Option<Meme>;

    /// List memes, newest first, optionally filtered by status
    async fn list(&self, status: Option<MemeStatus>) -> Vec<Meme>;

    /// Move a meme to a new moderation status
    async fn set_status(
        &self,
        id: Uuid,
        status: MemeStatus,
        at: DateTime<Utc>,
    ) -> Result<Meme, MemeError>;

    /// Record `user_id`'s vote on a published meme
    async fn apply_vote(
        &self,
        id: Uuid,
        user_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, MemeError>;

    /// Remove a meme and its votes
    async fn delete(&self, id: Uuid) -> Result<Meme, MemeError>;
}

#[derive(Default)]
struct Tables {
    memes: HashMap<Uuid, Meme>,
    votes: HashMap<(Uuid, String), VoteDirection>,
}

/// In-memory implementation of MemeStore
#[derive(Default)]
pub struct InMemoryMemeStore {
    tables: RwLock<Tables>,
}

impl InMemoryMemeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemeStore for InMemoryMemeStore {
    async fn insert(&self, meme: Meme) -> Result<Meme, MemeError> {
        let mut tables = self.tables.write().await;
        if tables.memes.contains_key(&meme.id) {
            return Err(MemeError::Conflict(format!("meme {} already exists", meme.id)));
        }
        tables.memes.insert(meme.id, meme.clone());
        Ok(meme)
    }

    async fn get(&self, id: Uuid) -> Option<Meme> {
        self.tables.read().await.memes.get(&id).cloned()
    }

    async fn list(&self, status: Option<MemeStatus>) -> Vec<Meme> {
        let tables = self.tables.read().await;
        let mut memes: Vec<Meme> = tables
            .memes
            .values()
            .filter(|meme| status.is_none_or(|s| meme.status == s))
            .cloned()
            .collect();
        memes.sort_by(|a, b| {
            let a_at = a.approved_at.unwrap_or(a.created_at);
            let b_at = b.approved_at.unwrap_or(b.created_at);
            b_at.cmp(&a_at).then_with(|| b.id.cmp(&a.id))
        });
        memes
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: MemeStatus,
        at: DateTime<Utc>,
    ) -> Result<Meme, MemeError> {
        let mut tables = self.tables.write().await;
        let meme = tables
            .memes
            .get_mut(&id)
            .ok_or_else(|| MemeError::NotFound(id.to_string()))?;

        if !meme.status.can_transition_to(status) {
            return Err(MemeError::InvalidTransition {
                from: meme.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        meme.status = status;
        if status == MemeStatus::Approved {
            meme.approved_at = Some(at);
        }
        Ok(meme.clone())
    }

    async fn apply_vote(
        &self,
        id: Uuid,
        user_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, MemeError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let meme = tables
            .memes
            .get_mut(&id)
            .ok_or_else(|| MemeError::NotFound(id.to_string()))?;
        if !meme.is_published() {
            return Err(MemeError::NotPublished(id.to_string()));
        }

        let key = (id, user_id.to_string());
        let previous = tables
            .votes
            .get(&key)
            .copied()
            .unwrap_or(VoteDirection::None);
        if previous == direction {
            return Ok(VoteOutcome {
                meme: meme.clone(),
                changed: false,
            });
        }

        match previous {
            VoteDirection::Up => meme.upvotes = meme.upvotes.saturating_sub(1),
            VoteDirection::Down => meme.downvotes = meme.downvotes.saturating_sub(1),
            VoteDirection::None => {}
        }
        match direction {
            VoteDirection::Up => meme.upvotes += 1,
            VoteDirection::Down => meme.downvotes += 1,
            VoteDirection::None => {}
        }

        if direction == VoteDirection::None {
            tables.votes.remove(&key);
        } else {
            tables.votes.insert(key, direction);
        }

        Ok(VoteOutcome {
            meme: meme.clone(),
            changed: true,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<Meme, MemeError> {
        let mut tables = self.tables.write().await;
        let meme = tables
            .memes
            .remove(&id)
            .ok_or_else(|| MemeError::NotFound(id.to_string()))?;
        tables.votes.retain(|(meme_id, _), _| *meme_id != id);
        Ok(meme)
    }
}
