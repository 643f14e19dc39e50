//! Update event type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Kind of update distributed to clients
///
/// Known kinds have dedicated variants; anything else is carried verbatim so
/// producers can introduce new event types without a release of this crate.
/// On the wire every kind is a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A meme was approved and is now publicly visible
    NewMeme,
    /// A published meme changed (e.g. its vote tally)
    MemeUpdated,
    /// A published meme was removed
    MemeDeleted,
    /// Any other event type
    Custom(String),
}

impl EventKind {
    /// Wire representation of this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewMeme => "new_meme",
            Self::MemeUpdated => "meme_updated",
            Self::MemeDeleted => "meme_deleted",
            Self::Custom(name) => name,
        }
    }

    /// Parse from the wire representation (never fails)
    pub fn parse(s: &str) -> Self {
        match s {
            "new_meme" => Self::NewMeme,
            "meme_updated" => Self::MemeUpdated,
            "meme_deleted" => Self::MemeDeleted,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match Self::parse(&s) {
            Self::Custom(_) => Self::Custom(s),
            known => known,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event recorded in the update queue
///
/// `timestamp` is assigned by the queue at record time and is the ordering
/// key polling clients use to ask for "everything after T".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Opaque domain data (usually the full record that changed)
    pub payload: Value,
    /// When the event was recorded
    pub timestamp: Timestamp,
}
