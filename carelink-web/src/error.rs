//! Web error translation
//!
//! Every rejection leaving the API is the same JSON envelope:
//! `{message, message_client, extra, type}`: an internal description,
//! a client-facing message, optional structured detail, and a
//! machine-readable code. Production paths never leak stack traces or
//! schema details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carelink_applications::{AuthError, SignedTokenError};
use carelink_core::CareError;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

pub type WebResult<T> = Result<T, WebError>;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("permission denied: {required}")]
    PermissionDenied { required: &'static str },

    #[error(transparent)]
    SignedToken(#[from] SignedTokenError),

    #[error(transparent)]
    Care(#[from] CareError),

    #[error("{message}")]
    BadRequest {
        message: String,
        error_type: &'static str,
        extra: Value,
    },

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl WebError {
    /// Denial from an object-permission predicate.
    pub fn forbidden(required: &'static str) -> Self {
        WebError::PermissionDenied { required }
    }

    pub fn bad_request(message: impl Into<String>, error_type: &'static str) -> Self {
        WebError::BadRequest {
            message: message.into(),
            error_type,
            extra: Value::Null,
        }
    }

    pub fn bad_request_with(
        message: impl Into<String>,
        error_type: &'static str,
        extra: Value,
    ) -> Self {
        WebError::BadRequest {
            message: message.into(),
            error_type,
            extra,
        }
    }
}

/// Build the uniform error envelope body.
fn envelope(message: String, message_client: &str, extra: Value, error_type: &str) -> Value {
    json!({
        "message": message,
        "message_client": message_client,
        "extra": extra,
        "type": error_type,
    })
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            WebError::Auth(auth) => auth_response(auth),

            WebError::PermissionDenied { required } => (
                StatusCode::FORBIDDEN,
                envelope(
                    format!("permission check failed: {}", required),
                    "You do not have permission to perform this action.",
                    Value::Null,
                    "permission_denied",
                ),
            ),

            WebError::SignedToken(rejection) => (
                StatusCode::FORBIDDEN,
                envelope(
                    rejection.to_string(),
                    "This link is no longer valid. Please request a new one.",
                    Value::Null,
                    rejection.error_type(),
                ),
            ),

            WebError::Care(care) => care_response(care),

            WebError::BadRequest {
                message,
                error_type,
                extra,
            } => (
                StatusCode::BAD_REQUEST,
                envelope(message.clone(), message, extra.clone(), error_type),
            ),

            WebError::Internal(source) => {
                error!("unhandled internal error: {:#}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    envelope(
                        "internal error".to_string(),
                        "Something went wrong on our side.",
                        Value::Null,
                        "internal_error",
                    ),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn auth_response(auth: &AuthError) -> (StatusCode, Value) {
    match auth {
        // Declined and invalid credentials share one external shape;
        // the distinction lives in the variant and the logs.
        AuthError::Unauthenticated | AuthError::InvalidCredential { .. } => (
            StatusCode::UNAUTHORIZED,
            envelope(
                auth.to_string(),
                "Please sign in to continue.",
                Value::Null,
                auth.error_type(),
            ),
        ),
        AuthError::UnknownRoleHint { .. } => (
            StatusCode::UNAUTHORIZED,
            envelope(
                auth.to_string(),
                "Please sign in to continue.",
                Value::Null,
                auth.error_type(),
            ),
        ),
        // Signed-token rejections are explicit so the caller re-mints
        // instead of re-authenticating.
        AuthError::SignedToken(rejection) => (
            StatusCode::FORBIDDEN,
            envelope(
                rejection.to_string(),
                "This link is no longer valid. Please request a new one.",
                Value::Null,
                rejection.error_type(),
            ),
        ),
        AuthError::Storage(source) => {
            error!("storage failure during authentication: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                envelope(
                    "authentication storage failure".to_string(),
                    "Something went wrong on our side.",
                    Value::Null,
                    auth.error_type(),
                ),
            )
        }
    }
}

fn care_response(care: &CareError) -> (StatusCode, Value) {
    match care {
        CareError::NotFound { resource } => (
            StatusCode::NOT_FOUND,
            envelope(
                format!("{} not found", resource),
                "The requested record does not exist.",
                Value::Null,
                care.error_type(),
            ),
        ),
        CareError::Validation { message, field } => (
            StatusCode::BAD_REQUEST,
            envelope(
                message.clone(),
                "Some of the submitted values are invalid.",
                field
                    .as_ref()
                    .map(|f| json!({ "field": f }))
                    .unwrap_or(Value::Null),
                care.error_type(),
            ),
        ),
        // Deliberately vague so unique-constraint details stay private.
        CareError::Integrity { message } => (
            StatusCode::BAD_REQUEST,
            envelope(
                message.clone(),
                "Something went wrong. You may already have a record with the same value.",
                Value::Null,
                care.error_type(),
            ),
        ),
        CareError::Storage { .. } | CareError::Internal { .. } => {
            error!("storage error: {}", care);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                envelope(
                    care.to_string(),
                    "Something went wrong on our side.",
                    Value::Null,
                    care.error_type(),
                ),
            )
        }
    }
}
