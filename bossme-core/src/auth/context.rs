//! Authentication context types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role granted to a user, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Parse a role header value; unknown values yield None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "moderator" | "mod" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// True if this role grants at least `required`
    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified identity of a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id issued by the OAuth provider
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    /// Identity with the default `user` role
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Authentication context for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AuthContext {
    /// Identity forwarded by the OAuth proxy
    Authenticated {
        /// The authenticated user's identity
        identity: Identity,
    },
    /// No identity supplied
    Anonymous,
}

impl AuthContext {
    /// Returns the identity if authenticated, None otherwise
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthContext::Authenticated { identity } => Some(identity),
            AuthContext::Anonymous => None,
        }
    }

    /// Returns true if the request is authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated { .. })
    }

    /// True if the caller is authenticated with at least `required`
    pub fn has_role(&self, required: Role) -> bool {
        self.identity()
            .is_some_and(|identity| identity.role.satisfies(required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.satisfies(Role::Moderator));
        assert!(Role::Moderator.satisfies(Role::Moderator));
        assert!(!Role::User.satisfies(Role::Moderator));
        assert!(Role::User.satisfies(Role::User));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" Moderator "), Some(Role::Moderator));
        assert_eq!(Role::parse("mod"), Some(Role::Moderator));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn test_auth_context_authenticated() {
        let ctx = AuthContext::Authenticated {
            identity: Identity::new("u1").with_role(Role::Moderator),
        };
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.identity().unwrap().user_id, "u1");
        assert!(ctx.has_role(Role::Moderator));
        assert!(!ctx.has_role(Role::Admin));
    }

    #[test]
    fn test_auth_context_anonymous() {
        let ctx = AuthContext::Anonymous;
        assert!(!ctx.is_authenticated());
        assert!(ctx.identity().is_none());
        assert!(!ctx.has_role(Role::User));
    }

    #[test]
    fn test_auth_context_serialize_authenticated() {
        let ctx = AuthContext::Authenticated {
            identity: Identity::new("u1"),
        };
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"source\":\"authenticated\""));
        assert!(json.contains("\"role\":\"user\""));
    }
}
