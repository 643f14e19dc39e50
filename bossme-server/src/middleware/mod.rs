//! Request middleware

mod auth;

pub use auth::{identity_middleware, require_identity, require_role, resolve_identity};
