//! Authentication extractors
//!
//! Thin adapters from HTTP requests to the applications-layer
//! authenticator. Handlers that accept the signed-token body flow build
//! their own [`AuthRequest`] instead, because only they hold the parsed
//! body.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use carelink_applications::{AuthContext, AuthRequest, Principal};
use carelink_core::Verb;

use crate::{error::WebError, state::AppState};

/// Header carrying the optional role hint.
pub const ROLE_HINT_HEADER: &str = "x-role-hint";
/// Cookie carrying the staff session key.
pub const SESSION_COOKIE: &str = "session";

/// Build the backend-facing credential view of a request.
pub fn auth_request_from_headers(headers: &HeaderMap, verb: Verb) -> AuthRequest {
    AuthRequest {
        authorization: header_value(headers, header::AUTHORIZATION.as_str()),
        role_hint: header_value(headers, ROLE_HINT_HEADER),
        session_cookie: session_cookie(headers),
        verb,
        body_token: None,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.to_string())
    })
}

/// Any authenticated identity; rejects with the 401 envelope when every
/// backend declines.
pub struct Authenticated(pub AuthContext);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request =
            auth_request_from_headers(&parts.headers, Verb::from_method(parts.method.as_str()));

        let context = state.authenticator.authenticate(&request).await?;
        Ok(Authenticated(context))
    }
}

/// Staff identities only.
pub struct RequireStaff(pub AuthContext);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Authenticated(context) = Authenticated::from_request_parts(parts, state).await?;

        if context.is_staff() {
            Ok(RequireStaff(context))
        } else {
            Err(WebError::forbidden("staff"))
        }
    }
}

/// The internal service principal only.
pub struct RequireInternal(pub AuthContext);

impl FromRequestParts<AppState> for RequireInternal {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Authenticated(context) = Authenticated::from_request_parts(parts, state).await?;

        match context.principal() {
            Principal::Internal => Ok(RequireInternal(context)),
            _ => Err(WebError::forbidden("internal service")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_is_extracted_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc123; lang=en"),
        );

        assert_eq!(session_cookie(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);
    }

    #[test]
    fn similarly_named_cookies_do_not_match() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session_backup=zzz"),
        );

        assert_eq!(session_cookie(&headers), None);
    }
}
