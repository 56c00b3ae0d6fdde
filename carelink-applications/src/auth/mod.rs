//! Authentication and authorization
//!
//! Token-backed login per user population, an ordered multi-backend
//! authenticator with a role-hint short-circuit, signed tokens for
//! bounded pre-login writes, and the object-permission predicates.

pub mod backends;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod signed;
pub mod tokens;

pub use backends::{AuthBackend, AuthError, AuthRequest, Authenticator, BackendKind};
pub use identity::{AuthContext, Principal, RoleTag};
pub use signed::{SignedTokenError, SignedTokenService};
pub use tokens::{TokenRecord, TokenStore};
