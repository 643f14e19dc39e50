use bossme_core::DEFAULT_QUEUE_CAPACITY;
use bossme_server::ws::{DEFAULT_SEND_BUFFER, DEFAULT_SEND_TIMEOUT_MS};
use bossme_server::{DEFAULT_PUSH_PATH, ServerConfig};
use serde::{Deserialize, Serialize};

/// Default host for the bossme server
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the bossme server
pub const DEFAULT_PORT: u16 = 8787;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBossmeConfig {
    #[serde(default)]
    pub server: RawServerSection,

    #[serde(default)]
    pub updates: RawUpdatesSection,

    #[serde(default)]
    pub push: RawPushSection,

    #[serde(default)]
    pub auth: RawAuthSection,
}

/// Server section as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawUpdatesSection {
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPushSection {
    pub path: Option<String>,
    pub send_buffer: Option<usize>,
    pub send_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthSection {
    pub trust_proxy_headers: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BossmeConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub updates: UpdatesSection,

    #[serde(default)]
    pub push: PushSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl BossmeConfig {
    /// Settings for the server crate
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            queue_capacity: self.updates.queue_capacity,
            send_buffer: self.push.send_buffer,
            send_timeout_ms: self.push.send_timeout_ms,
            push_path: self.push.path.clone(),
            trust_proxy_headers: self.auth.trust_proxy_headers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesSection {
    /// Updates kept for polling clients
    pub queue_capacity: usize,
}

impl Default for UpdatesSection {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSection {
    /// WebSocket route
    pub path: String,

    /// Frames buffered per connection before it is dropped
    pub send_buffer: usize,

    /// Milliseconds a socket write may block before the connection is dropped
    pub send_timeout_ms: u64,
}

impl Default for PushSection {
    fn default() -> Self {
        Self {
            path: DEFAULT_PUSH_PATH.to_string(),
            send_buffer: DEFAULT_SEND_BUFFER,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSection {
    /// Trust identity headers from the OAuth proxy
    pub trust_proxy_headers: bool,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            trust_proxy_headers: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = BossmeConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.updates.queue_capacity, 100);
        assert_eq!(config.push.path, "/ws");
        assert_eq!(config.push.send_buffer, 32);
        assert!(config.auth.trust_proxy_headers);
    }

    #[test]
    fn test_defaults_match_server_defaults() {
        let from_cli = BossmeConfig::default().to_server_config();
        let server = ServerConfig::default();

        assert_eq!(from_cli.addr(), server.addr());
        assert_eq!(from_cli.queue_capacity, server.queue_capacity);
        assert_eq!(from_cli.send_buffer, server.send_buffer);
        assert_eq!(from_cli.send_timeout_ms, server.send_timeout_ms);
        assert_eq!(from_cli.push_path, server.push_path);
        assert_eq!(from_cli.trust_proxy_headers, server.trust_proxy_headers);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BossmeConfig {
            server: ServerSection {
                host: "127.0.0.1".to_string(),
                port: 9000,
            },
            push: PushSection {
                path: "/realtime".to_string(),
                send_buffer: 8,
                send_timeout_ms: 750,
            },
            ..Default::default()
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: BossmeConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[server]
port = 9000

[push]
send_buffer = 4
send_timeout_ms = 1500
"#;
        let raw: RawBossmeConfig = toml::from_str(toml_str).unwrap();

        // Only what was set is Some
        assert_eq!(raw.server.port, Some(9000));
        assert!(raw.server.host.is_none());
        assert_eq!(raw.push.send_buffer, Some(4));
        assert_eq!(raw.push.send_timeout_ms, Some(1500));
        assert!(raw.push.path.is_none());
        assert!(raw.updates.queue_capacity.is_none());
        assert!(raw.auth.trust_proxy_headers.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawBossmeConfig = toml::from_str("").unwrap();

        assert!(raw.server.host.is_none());
        assert!(raw.server.port.is_none());
        assert!(raw.updates.queue_capacity.is_none());
    }
}
