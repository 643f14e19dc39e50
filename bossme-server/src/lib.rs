//! bossme-server - HTTP and WebSocket server for bossme.me realtime updates
//!
//! This crate owns the update queue, the push connection registry and the
//! broadcaster that feeds both. Browsers hold a WebSocket open at the push
//! path; clients that cannot keep one open poll `GET /updates?since=T`.

pub mod broadcast;
mod error;
pub mod http;
pub mod middleware;
mod state;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use bossme_core::DEFAULT_QUEUE_CAPACITY;
use tokio::net::TcpListener;

pub use broadcast::{BroadcastReport, BroadcastService};
pub use error::{ApiError, ErrorBody, ServerError};
pub use http::{HealthResponse, MemeView, UpdatesResponse, create_router};
pub use middleware::identity_middleware;
pub use state::{AppState, DEFAULT_PUSH_PATH, PushConfig};

/// The main bossme server
pub struct BossmeServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl BossmeServer {
    /// Create a new server with state built from the config
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(AppState::from_config(&config));
        Self { config, state }
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        self.config.validate()?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!(
            "bossme server listening on {} (push at {})",
            local_addr,
            self.state.push.path
        );

        let router = create_router(Arc::clone(&self.state));
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

        tracing::info!("bossme server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// How many updates polling clients can catch up on
    pub queue_capacity: usize,
    /// Outbound frames buffered per push connection before it is evicted
    pub send_buffer: usize,
    /// Milliseconds a single socket write may block before the connection is dropped
    pub send_timeout_ms: u64,
    /// Route of the WebSocket push transport
    pub push_path: String,
    /// Trust identity headers forwarded by the OAuth proxy
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_buffer: ws::DEFAULT_SEND_BUFFER,
            send_timeout_ms: ws::DEFAULT_SEND_TIMEOUT_MS,
            push_path: DEFAULT_PUSH_PATH.to_string(),
            trust_proxy_headers: true,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:8787")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.queue_capacity == 0 {
            return Err(ServerError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.send_buffer == 0 {
            return Err(ServerError::InvalidConfig(
                "send_buffer must be at least 1".to_string(),
            ));
        }
        if self.send_timeout_ms == 0 {
            return Err(ServerError::InvalidConfig(
                "send_timeout_ms must be at least 1".to_string(),
            ));
        }
        http::validate_push_path(&self.push_path)
    }
}
