//! WebSocket protocol message types
//!
//! Every frame is a JSON object with a `type` discriminator. Broadcast
//! frames carry the event kind as their type and the payload under `data`.

use bossme_core::{EventKind, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Greeting sent once a connection is registered
pub const CONNECTION_MESSAGE: &str = "Connected to bossme.me realtime updates";

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness check
    Ping,

    /// Any other well-formed message type
    #[serde(other)]
    Unknown,
}

/// Control messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges a newly opened connection
    Connection {
        /// Human readable greeting
        message: String,
    },

    /// Reply to a client ping
    Pong {
        /// Server time in milliseconds since the Unix epoch
        timestamp: Timestamp,
    },
}

impl ServerMessage {
    pub fn connected() -> Self {
        Self::Connection {
            message: CONNECTION_MESSAGE.to_string(),
        }
    }
}

/// Server-to-client broadcast frame: `{ "type": <kind>, "data": <payload> }`
#[derive(Debug, Serialize)]
pub struct BroadcastMessage<'a> {
    /// Event kind
    #[serde(rename = "type")]
    pub event_type: &'a str,
    /// Event payload
    pub data: &'a Value,
}

impl<'a> BroadcastMessage<'a> {
    pub fn new(kind: &'a EventKind, data: &'a Value) -> Self {
        Self {
            event_type: kind.as_str(),
            data,
        }
    }
}
