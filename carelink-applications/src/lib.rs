//! Carelink Applications - domain, authentication, and authorization
//!
//! The framework-free middle layer: user populations and care records,
//! the token store and multi-backend authenticator, object permissions,
//! signed pre-auth tokens, grouped metrics, and notification dispatch.
//! The web crate adapts all of this to HTTP.

pub mod auth;
pub mod domain;
pub mod metrics;
pub mod notify;
pub mod store;

pub use auth::{
    AuthBackend, AuthContext, AuthError, AuthRequest, Authenticator, BackendKind, Principal,
    RoleTag, SignedTokenError, SignedTokenService, TokenStore,
};
pub use notify::{Notification, Notifier};
pub use store::CareStore;
