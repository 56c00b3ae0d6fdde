//! Authentication backends
//!
//! An ordered list of strategies is consulted per request. Each backend
//! either authenticates, declines ("not my credential, try the next
//! one"), or fails hard ("this was addressed to me and it is wrong, so
//! stop"). A client-supplied role hint lets every non-matching backend
//! decline before touching storage; a hinted backend with a bad
//! credential fails hard instead of falling through, so a wrong token
//! can never be re-interpreted by a later backend.

use std::sync::Arc;

use async_trait::async_trait;
use carelink_core::{CareError, Verb};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::CareStore;

use super::identity::{AuthContext, Principal, RoleTag};
use super::signed::{SignedTokenError, SignedTokenService, UPDATE_NURSE_UNAUTHENTICATED};
use super::tokens::TokenStore;

/// Identifies a backend, and doubles as the `X-Role-Hint` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    NurseToken,
    ClientToken,
    OrganizationToken,
    DonorToken,
    Internal,
    Session,
    NurseSigned,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::NurseToken => write!(f, "nurse_token"),
            BackendKind::ClientToken => write!(f, "client_token"),
            BackendKind::OrganizationToken => write!(f, "organization_token"),
            BackendKind::DonorToken => write!(f, "donor_token"),
            BackendKind::Internal => write!(f, "internal"),
            BackendKind::Session => write!(f, "session"),
            BackendKind::NurseSigned => write!(f, "nurse_signed"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nurse_token" => Ok(BackendKind::NurseToken),
            "client_token" => Ok(BackendKind::ClientToken),
            "organization_token" => Ok(BackendKind::OrganizationToken),
            "donor_token" => Ok(BackendKind::DonorToken),
            "internal" => Ok(BackendKind::Internal),
            "session" => Ok(BackendKind::Session),
            "nurse_signed" => Ok(BackendKind::NurseSigned),
            _ => Err(format!("Unknown backend kind: {}", s)),
        }
    }
}

/// The credential material extracted from one request. Deriving this
/// up front keeps the backends free of any web-framework types.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Raw `X-Role-Hint` header value.
    pub role_hint: Option<String>,
    /// Value of the `session` cookie.
    pub session_cookie: Option<String>,
    /// Request verb classification.
    pub verb: Verb,
    /// Signed token carried in a mutation body, when the handler
    /// supports the pre-login flow.
    pub body_token: Option<String>,
}

impl Default for AuthRequest {
    fn default() -> Self {
        Self {
            authorization: None,
            role_hint: None,
            session_cookie: None,
            verb: Verb::Read,
            body_token: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Every backend declined.
    #[error("no credential matched any authentication backend")]
    Unauthenticated,

    /// A backend recognized the credential as addressed to it and found
    /// it wrong. Externally indistinguishable from `Unauthenticated`;
    /// internally it stops the backend chain.
    #[error("invalid credential for {backend} backend")]
    InvalidCredential { backend: BackendKind },

    #[error("unknown role hint: {hint}")]
    UnknownRoleHint { hint: String },

    /// Signed-token rejections carry their reason so the caller knows
    /// to re-mint rather than re-login.
    #[error("signed token rejected: {0}")]
    SignedToken(#[from] SignedTokenError),

    #[error("storage failure during authentication")]
    Storage(#[from] CareError),
}

impl AuthError {
    /// Machine-readable code for the API error envelope. Declined and
    /// invalid credentials share one external shape on purpose.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "not_authenticated",
            AuthError::InvalidCredential { .. } => "not_authenticated",
            AuthError::UnknownRoleHint { .. } => "invalid_role_hint",
            AuthError::SignedToken(e) => e.error_type(),
            AuthError::Storage(_) => "storage_error",
        }
    }
}

/// One authentication strategy.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// `Ok(None)` declines; `Ok(Some(_))` authenticates; `Err(_)` stops
    /// the chain. `hinted` is true when the request explicitly named
    /// this backend, which upgrades a miss from decline to hard failure.
    async fn authenticate(
        &self,
        request: &AuthRequest,
        hinted: bool,
    ) -> Result<Option<AuthContext>, AuthError>;
}

/// Token backend for one user population.
pub struct RoleTokenBackend {
    kind: BackendKind,
    role: RoleTag,
    tokens: Arc<TokenStore>,
    store: Arc<CareStore>,
}

impl RoleTokenBackend {
    pub fn nurse(tokens: Arc<TokenStore>, store: Arc<CareStore>) -> Self {
        Self {
            kind: BackendKind::NurseToken,
            role: RoleTag::Nurse,
            tokens,
            store,
        }
    }

    pub fn client(tokens: Arc<TokenStore>, store: Arc<CareStore>) -> Self {
        Self {
            kind: BackendKind::ClientToken,
            role: RoleTag::Client,
            tokens,
            store,
        }
    }

    pub fn organization(tokens: Arc<TokenStore>, store: Arc<CareStore>) -> Self {
        Self {
            kind: BackendKind::OrganizationToken,
            role: RoleTag::Organization,
            tokens,
            store,
        }
    }

    pub fn donor(tokens: Arc<TokenStore>, store: Arc<CareStore>) -> Self {
        Self {
            kind: BackendKind::DonorToken,
            role: RoleTag::Donor,
            tokens,
            store,
        }
    }

    async fn load_principal(&self, user_id: i64) -> Result<Option<Principal>, AuthError> {
        let principal = match self.role {
            RoleTag::Nurse => self.store.get_nurse(user_id).await?.map(Principal::Nurse),
            RoleTag::Client => self.store.get_client(user_id).await?.map(Principal::Client),
            RoleTag::Organization => self
                .store
                .get_organization_user(user_id)
                .await?
                .map(Principal::Organization),
            RoleTag::Donor => self
                .store
                .get_donor_user(user_id)
                .await?
                .map(Principal::Donor),
            RoleTag::Staff => self.store.get_staff(user_id).await?.map(Principal::Staff),
            RoleTag::Internal => None,
        };
        Ok(principal)
    }
}

#[async_trait]
impl AuthBackend for RoleTokenBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn authenticate(
        &self,
        request: &AuthRequest,
        hinted: bool,
    ) -> Result<Option<AuthContext>, AuthError> {
        let Some(key) = request.authorization.as_deref() else {
            return Ok(None);
        };

        match self.tokens.lookup(self.role, key).await? {
            Some(user_id) => match self.load_principal(user_id).await? {
                Some(principal) => Ok(Some(AuthContext::new(principal, self.kind))),
                None => {
                    // A token row pointing at a deleted user is broken
                    // state, never a fallthrough candidate.
                    warn!(role = %self.role, user_id, "token resolved to missing user");
                    Err(AuthError::InvalidCredential { backend: self.kind })
                }
            },
            None if hinted => Err(AuthError::InvalidCredential { backend: self.kind }),
            None => Ok(None),
        }
    }
}

/// Backend for in-house processes presenting the shared service secret.
pub struct InternalBackend {
    secret: String,
}

impl InternalBackend {
    /// The expected secret is injected here; nothing reads global
    /// settings at authentication time.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl AuthBackend for InternalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Internal
    }

    async fn authenticate(
        &self,
        request: &AuthRequest,
        hinted: bool,
    ) -> Result<Option<AuthContext>, AuthError> {
        // An unset secret disables the backend outright; matching the
        // empty string would authenticate anyone.
        if self.secret.is_empty() {
            return Ok(None);
        }
        let Some(credential) = request.authorization.as_deref() else {
            return Ok(None);
        };

        // TODO: use a constant-time comparison for the shared secret.
        if credential == self.secret {
            return Ok(Some(AuthContext::new(
                Principal::Internal,
                BackendKind::Internal,
            )));
        }

        if hinted {
            return Err(AuthError::InvalidCredential {
                backend: BackendKind::Internal,
            });
        }
        Ok(None)
    }
}

/// Staff session backend: the `session` cookie holds a staff token key.
pub struct SessionBackend {
    tokens: Arc<TokenStore>,
    store: Arc<CareStore>,
}

impl SessionBackend {
    pub fn new(tokens: Arc<TokenStore>, store: Arc<CareStore>) -> Self {
        Self { tokens, store }
    }
}

#[async_trait]
impl AuthBackend for SessionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Session
    }

    async fn authenticate(
        &self,
        request: &AuthRequest,
        hinted: bool,
    ) -> Result<Option<AuthContext>, AuthError> {
        let Some(key) = request.session_cookie.as_deref() else {
            return Ok(None);
        };

        match self.tokens.lookup(RoleTag::Staff, key).await? {
            Some(user_id) => match self.store.get_staff(user_id).await? {
                Some(staff) => Ok(Some(AuthContext::new(
                    Principal::Staff(staff),
                    BackendKind::Session,
                ))),
                None => Err(AuthError::InvalidCredential {
                    backend: BackendKind::Session,
                }),
            },
            None if hinted => Err(AuthError::InvalidCredential {
                backend: BackendKind::Session,
            }),
            None => Ok(None),
        }
    }
}

/// Backend for nurses that exist but have never logged in: a signed
/// token in the mutation body, locked to the profile-completion
/// namespace. Reads never activate it.
pub struct UnauthenticatedNurseBackend {
    signer: Arc<SignedTokenService>,
    store: Arc<CareStore>,
}

impl UnauthenticatedNurseBackend {
    pub fn new(signer: Arc<SignedTokenService>, store: Arc<CareStore>) -> Self {
        Self { signer, store }
    }
}

#[async_trait]
impl AuthBackend for UnauthenticatedNurseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NurseSigned
    }

    async fn authenticate(
        &self,
        request: &AuthRequest,
        _hinted: bool,
    ) -> Result<Option<AuthContext>, AuthError> {
        if !request.verb.is_mutation() {
            return Ok(None);
        }
        let Some(token) = request.body_token.as_deref() else {
            return Ok(None);
        };

        // A present-but-bad token is a hard failure with its specific
        // reason; the caller needs to know to re-mint, not to re-login.
        let nurse_id = self.signer.verify(token, UPDATE_NURSE_UNAUTHENTICATED)?;

        match self.store.get_nurse(nurse_id).await? {
            Some(nurse) => Ok(Some(AuthContext::new(
                Principal::Nurse(nurse),
                BackendKind::NurseSigned,
            ))),
            None => Err(AuthError::InvalidCredential {
                backend: BackendKind::NurseSigned,
            }),
        }
    }
}

/// Tries backends in order until one authenticates, one fails hard, or
/// all decline.
pub struct Authenticator {
    backends: Vec<Box<dyn AuthBackend>>,
}

impl Authenticator {
    pub fn new(backends: Vec<Box<dyn AuthBackend>>) -> Self {
        Self { backends }
    }

    /// The standard backend ordering used by the API surface.
    pub fn standard(
        tokens: Arc<TokenStore>,
        store: Arc<CareStore>,
        signer: Arc<SignedTokenService>,
        internal_secret: impl Into<String>,
    ) -> Self {
        Self::new(vec![
            Box::new(RoleTokenBackend::nurse(tokens.clone(), store.clone())),
            Box::new(RoleTokenBackend::client(tokens.clone(), store.clone())),
            Box::new(RoleTokenBackend::organization(
                tokens.clone(),
                store.clone(),
            )),
            Box::new(RoleTokenBackend::donor(tokens.clone(), store.clone())),
            Box::new(InternalBackend::new(internal_secret)),
            Box::new(SessionBackend::new(tokens, store.clone())),
            Box::new(UnauthenticatedNurseBackend::new(signer, store)),
        ])
    }

    pub async fn authenticate(&self, request: &AuthRequest) -> Result<AuthContext, AuthError> {
        let hint = match request.role_hint.as_deref() {
            Some(raw) => Some(raw.parse::<BackendKind>().map_err(|_| {
                AuthError::UnknownRoleHint {
                    hint: raw.to_string(),
                }
            })?),
            None => None,
        };

        for backend in &self.backends {
            if let Some(hint) = hint {
                if hint != backend.kind() {
                    continue;
                }
            }

            if let Some(context) = backend.authenticate(request, hint.is_some()).await? {
                debug!(
                    backend = %backend.kind(),
                    identity = %context.summary(),
                    "request authenticated"
                );
                return Ok(context);
            }
        }

        Err(AuthError::Unauthenticated)
    }
}
