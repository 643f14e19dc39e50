//! bossme serve command for running the realtime update server
//!
//! The serve command runs the bossme server which provides:
//! - WebSocket push of update events
//! - HTTP polling fallback at /updates
//! - Meme submission, moderation and voting API

use anyhow::{Context, Result};
use bossme_server::BossmeServer;
use clap::Args;
use tracing::info;

use crate::config::{BossmeConfig, ConfigLoader};

/// Arguments for the serve command
///
/// Flags override values from the config files.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Updates kept for polling clients
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Frames buffered per push connection before it is dropped
    #[arg(long)]
    pub send_buffer: Option<usize>,

    /// Milliseconds a socket write may block before the connection is dropped
    #[arg(long)]
    pub send_timeout_ms: Option<u64>,

    /// Route of the WebSocket push transport
    #[arg(long)]
    pub push_path: Option<String>,

    /// Ignore identity headers from the OAuth proxy
    #[arg(long)]
    pub no_trust_proxy: bool,
}

impl ServeArgs {
    /// Apply command line overrides on top of loaded config
    fn apply(&self, mut config: BossmeConfig) -> BossmeConfig {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(capacity) = self.queue_capacity {
            config.updates.queue_capacity = capacity;
        }
        if let Some(buffer) = self.send_buffer {
            config.push.send_buffer = buffer;
        }
        if let Some(timeout) = self.send_timeout_ms {
            config.push.send_timeout_ms = timeout;
        }
        if let Some(ref path) = self.push_path {
            config.push.path = path.clone();
        }
        if self.no_trust_proxy {
            config.auth.trust_proxy_headers = false;
        }
        config
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.apply(ConfigLoader::load()?);
    let server_config = config.to_server_config();
    server_config
        .validate()
        .context("Refusing to start with invalid configuration")?;

    info!(
        "Starting bossme server on {} (queue {}, push {})",
        server_config.addr(),
        server_config.queue_capacity,
        server_config.push_path
    );
    if !server_config.trust_proxy_headers {
        info!("Identity headers are ignored; all requests are anonymous");
    }

    BossmeServer::new(server_config)
        .run()
        .await
        .context("Server exited with an error")
}
