//! Shared application state for the bossme server

use std::sync::Arc;
use std::time::Duration;

use bossme_core::{AuthConfig, DEFAULT_QUEUE_CAPACITY, InMemoryMemeStore, MemeStore, UpdateQueue};
use chrono::{DateTime, Utc};

use crate::ServerConfig;
use crate::broadcast::BroadcastService;
use crate::ws::{ConnectionRegistry, DEFAULT_SEND_BUFFER, DEFAULT_SEND_TIMEOUT_MS};

/// Default route for the WebSocket push transport
pub const DEFAULT_PUSH_PATH: &str = "/ws";

/// Settings for the WebSocket push transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    /// Route the upgrade handler is mounted at
    pub path: String,
    /// Capacity of each connection's outbound queue
    pub send_buffer: usize,
    /// Longest a single socket write may block before the connection is dropped
    pub send_timeout: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PUSH_PATH.to_string(),
            send_buffer: DEFAULT_SEND_BUFFER,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }
}

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Recent updates for polling clients
    pub updates: Arc<UpdateQueue>,
    /// Live push connections
    pub connections: Arc<ConnectionRegistry>,
    /// Fan-out over both transports
    pub broadcaster: Arc<BroadcastService>,
    /// Meme persistence
    pub memes: Arc<dyn MemeStore>,
    /// Held across a meme change and its broadcast so frames follow store order
    pub meme_events: Arc<tokio::sync::Mutex<()>>,
    /// How callers are identified
    pub auth: AuthConfig,
    /// Push transport settings
    pub push: PushConfig,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new AppState with default components
    pub fn new() -> Self {
        Self::with_components(
            Arc::new(UpdateQueue::new(DEFAULT_QUEUE_CAPACITY)),
            Arc::new(InMemoryMemeStore::new()),
        )
    }

    /// Create AppState sized and configured from a server config
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_components(
            Arc::new(UpdateQueue::new(config.queue_capacity)),
            Arc::new(InMemoryMemeStore::new()),
        )
        .with_auth(AuthConfig {
            trust_proxy_headers: config.trust_proxy_headers,
            ..AuthConfig::default()
        })
        .with_push(PushConfig {
            path: config.push_path.clone(),
            send_buffer: config.send_buffer,
            send_timeout: Duration::from_millis(config.send_timeout_ms),
        })
    }

    /// Create AppState with custom components (for testing)
    pub fn with_components(updates: Arc<UpdateQueue>, memes: Arc<dyn MemeStore>) -> Self {
        let connections = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(BroadcastService::new(
            Arc::clone(&connections),
            Arc::clone(&updates),
        ));

        Self {
            updates,
            connections,
            broadcaster,
            memes,
            meme_events: Arc::new(tokio::sync::Mutex::new(())),
            auth: AuthConfig::default(),
            push: PushConfig::default(),
            started_at: Utc::now(),
        }
    }

    /// Replace the update queue, rewiring the broadcaster to record into it
    pub fn with_update_queue(mut self, updates: Arc<UpdateQueue>) -> Self {
        self.broadcaster = Arc::new(BroadcastService::new(
            Arc::clone(&self.connections),
            Arc::clone(&updates),
        ));
        self.updates = updates;
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_push(mut self, push: PushConfig) -> Self {
        self.push = push;
        self
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
