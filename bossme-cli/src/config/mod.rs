mod loader;
mod types;

pub use loader::{ConfigLoader, PROJECT_CONFIG_ENV};
pub use types::BossmeConfig;
