//! Configuration for proxy-forwarded identity

use serde::{Deserialize, Serialize};

/// Default header carrying the verified user id
pub const DEFAULT_USER_HEADER: &str = "x-bossme-user";

/// Default header carrying the user's role
pub const DEFAULT_ROLE_HEADER: &str = "x-bossme-role";

/// How the server learns who is calling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Trust identity headers set by the OAuth proxy. When false every
    /// request is anonymous.
    #[serde(default = "default_trust_proxy_headers")]
    pub trust_proxy_headers: bool,

    /// Header carrying the user id
    #[serde(default = "default_user_header")]
    pub user_header: String,

    /// Header carrying the role
    #[serde(default = "default_role_header")]
    pub role_header: String,
}

fn default_trust_proxy_headers() -> bool {
    true
}

fn default_user_header() -> String {
    DEFAULT_USER_HEADER.to_string()
}

fn default_role_header() -> String {
    DEFAULT_ROLE_HEADER.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            trust_proxy_headers: default_trust_proxy_headers(),
            user_header: default_user_header(),
            role_header: default_role_header(),
        }
    }
}

impl AuthConfig {
    /// Config that ignores identity headers entirely
    pub fn untrusted() -> Self {
        Self {
            trust_proxy_headers: false,
            ..Self::default()
        }
    }
}
