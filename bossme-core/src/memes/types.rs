//! Meme domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::MemeError;

/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Moderation status of a meme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemeStatus {
    /// Submitted, awaiting moderation
    Pending,
    /// Publicly visible
    Approved,
    /// Turned down by a moderator
    Rejected,
}

impl MemeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Moderation only moves memes out of the queue; decisions are final.
    pub fn can_transition_to(&self, next: MemeStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }
}

/// Direction of a user's vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
    /// Withdraw a previous vote
    None,
}

/// A meme submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meme {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    /// User id of the submitter
    pub author: String,
    pub status: MemeStatus,
    pub upvotes: u32,
    pub downvotes: u32,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Meme {
    /// Net score (upvotes minus downvotes)
    pub fn score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    pub fn is_published(&self) -> bool {
        self.status == MemeStatus::Approved
    }
}

/// Request to submit a meme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeme {
    pub title: String,
    pub image_url: String,
}

impl NewMeme {
    /// Validate and build a pending meme owned by `author`
    pub fn into_meme(self, author: impl Into<String>) -> Result<Meme, MemeError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(MemeError::Validation("title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(MemeError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }

        let image_url = self.image_url.trim().to_string();
        let has_host = Url::parse(&image_url).is_ok_and(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        });
        if !has_host {
            return Err(MemeError::Validation(
                "image_url must be an http(s) URL with a host".to_string(),
            ));
        }

        Ok(Meme {
            id: Uuid::new_v4(),
            title,
            image_url,
            author: author.into(),
            status: MemeStatus::Pending,
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            approved_at: None,
        })
    }
}
