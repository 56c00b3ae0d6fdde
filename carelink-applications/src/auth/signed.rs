//! Signed pre-auth tokens
//!
//! A stateless, integrity-protected credential that lets a freshly
//! created identity perform one narrow follow-up write before a real
//! login exists. The payload is exactly `{subject_id, expires,
//! namespace}`; the namespace binds the token to a single operation, so
//! a token minted for one flow is useless in any other. There is no
//! server-side revocation and no single-use bookkeeping: a valid token
//! may be replayed until it expires.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Namespace for completing a nurse profile created without a login.
pub const UPDATE_NURSE_UNAUTHENTICATED: &str = "update_nurse_unauthenticated";
/// Namespace for attaching records to a freshly created care account.
pub const ACCOUNT_CREATE_UNAUTHENTICATED: &str = "account_create_unauthenticated";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignedTokenError {
    #[error("token integrity check failed")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("token namespace mismatch")]
    WrongNamespace,
    #[error("token creation failed")]
    Creation,
}

impl SignedTokenError {
    /// Machine-readable code for the API error envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            SignedTokenError::Invalid => "token_invalid",
            SignedTokenError::Expired => "token_expired",
            SignedTokenError::WrongNamespace => "token_namespace",
            SignedTokenError::Creation => "token_creation_failed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims {
    subject_id: i64,
    /// Absolute expiry, unix seconds.
    expires: f64,
    namespace: String,
}

/// Mints and verifies signed pre-auth tokens. The signing secret is
/// injected at construction so instances are testable without any
/// process-wide state.
pub struct SignedTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SignedTokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Produce a token for `subject_id`, valid for `ttl` and only for
    /// `namespace`.
    pub fn mint(
        &self,
        subject_id: i64,
        namespace: &str,
        ttl: Duration,
    ) -> Result<String, SignedTokenError> {
        let expires = unix_now() + ttl.as_secs_f64();
        let claims = SignedClaims {
            subject_id,
            expires,
            namespace: namespace.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            debug!("failed to encode signed token: {}", e);
            SignedTokenError::Creation
        })
    }

    /// Check integrity, expiry, and namespace; all three are fatal. The
    /// expiry and namespace checks both run even when the other has
    /// already failed, and the most specific failure is reported.
    pub fn verify(
        &self,
        token: &str,
        expected_namespace: &str,
    ) -> Result<i64, SignedTokenError> {
        // Expiry is checked by hand below so the failure reason stays
        // distinguishable; the library's exp handling is disabled.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<SignedClaims>(token, &self.decoding, &validation).map_err(|e| {
            debug!("signed token integrity check failed: {}", e);
            SignedTokenError::Invalid
        })?;

        let claims = data.claims;
        let expired = claims.expires < unix_now();
        let namespace_ok = claims.namespace == expected_namespace;

        if expired {
            return Err(SignedTokenError::Expired);
        }
        if !namespace_ok {
            return Err(SignedTokenError::WrongNamespace);
        }

        Ok(claims.subject_id)
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
