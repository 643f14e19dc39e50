//! Identity forwarded by the upstream OAuth proxy
//!
//! The OAuth handshake happens outside this server. The proxy in front of
//! it verifies the caller and forwards the user id and role as headers;
//! this module holds the types the server turns those headers into.

mod config;
mod context;

pub use config::{AuthConfig, DEFAULT_ROLE_HEADER, DEFAULT_USER_HEADER};
pub use context::{AuthContext, Identity, Role};
