use super::types::{
    AuthSection, BossmeConfig, DEFAULT_HOST, DEFAULT_PORT, PushSection, RawAuthSection,
    RawBossmeConfig, RawPushSection, RawServerSection, RawUpdatesSection, ServerSection,
    UpdatesSection,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the project config directory
pub const PROJECT_CONFIG_ENV: &str = "BOSSME_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<BossmeConfig> {
        Self::load_layers(
            Self::user_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Merge the given config files over the defaults; missing files are skipped
    pub fn load_layers(user_path: Option<&Path>, project_path: &Path) -> Result<BossmeConfig> {
        let mut raw = RawBossmeConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user_path
            && let Some(user_config) = Self::read_raw(user_path)?
        {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        // Convert to final config with defaults applied
        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<Option<RawBossmeConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw: RawBossmeConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!("Loaded config layer from {}", path.display());
        Ok(Some(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bossme").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with BOSSME_PROJECT_CONFIG_DIR (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        Self::project_config_path_from(std::env::var(PROJECT_CONFIG_ENV).ok())
    }

    fn project_config_path_from(override_dir: Option<String>) -> PathBuf {
        match override_dir {
            Some(dir) => PathBuf::from(dir).join("config.toml"),
            None => PathBuf::from(".bossme/config.toml"),
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawBossmeConfig, overlay: RawBossmeConfig) -> RawBossmeConfig {
        RawBossmeConfig {
            server: RawServerSection {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            updates: RawUpdatesSection {
                queue_capacity: overlay
                    .updates
                    .queue_capacity
                    .or(base.updates.queue_capacity),
            },
            push: RawPushSection {
                path: overlay.push.path.or(base.push.path),
                send_buffer: overlay.push.send_buffer.or(base.push.send_buffer),
                send_timeout_ms: overlay.push.send_timeout_ms.or(base.push.send_timeout_ms),
            },
            auth: RawAuthSection {
                trust_proxy_headers: overlay
                    .auth
                    .trust_proxy_headers
                    .or(base.auth.trust_proxy_headers),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawBossmeConfig) -> BossmeConfig {
        let updates = UpdatesSection::default();
        let push = PushSection::default();
        let auth = AuthSection::default();

        BossmeConfig {
            server: ServerSection {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            updates: UpdatesSection {
                queue_capacity: raw.updates.queue_capacity.unwrap_or(updates.queue_capacity),
            },
            push: PushSection {
                path: raw.push.path.unwrap_or(push.path),
                send_buffer: raw.push.send_buffer.unwrap_or(push.send_buffer),
                send_timeout_ms: raw.push.send_timeout_ms.unwrap_or(push.send_timeout_ms),
            },
            auth: AuthSection {
                trust_proxy_headers: raw
                    .auth
                    .trust_proxy_headers
                    .unwrap_or(auth.trust_proxy_headers),
            },
        }
    }
}
