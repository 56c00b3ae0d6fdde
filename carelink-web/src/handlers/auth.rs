//! Login and logout
//!
//! Each population logs in with email and password and receives its
//! opaque bearer token, the same token on every login until it is
//! deleted by logout.

use axum::{extract::State, Json};
use carelink_applications::auth::password::verify_password;
use carelink_applications::{AuthError, BackendKind, RoleTag};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    error::{WebError, WebResult},
    extract::Authenticated,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn invalid_login(backend: BackendKind) -> WebError {
    WebError::Auth(AuthError::InvalidCredential { backend })
}

pub async fn nurse_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<Value>> {
    let nurse = state
        .store
        .find_nurse_by_email(&request.email)
        .await?
        .filter(|nurse| verify_password(&request.password, &nurse.password_hash))
        .ok_or(invalid_login(BackendKind::NurseToken))?;

    let token = state.tokens.get_or_create(RoleTag::Nurse, nurse.id).await?;
    info!(nurse_id = nurse.id, "nurse logged in");

    Ok(Json(json!({
        "token": token.key,
        "id": nurse.id,
        "full_name": nurse.full_name(),
        "email": nurse.email,
    })))
}

pub async fn client_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<Value>> {
    let client = state
        .store
        .find_client_by_email(&request.email)
        .await?
        .filter(|client| verify_password(&request.password, &client.password_hash))
        .ok_or(invalid_login(BackendKind::ClientToken))?;

    let token = state
        .tokens
        .get_or_create(RoleTag::Client, client.id)
        .await?;
    info!(client_id = client.id, "client logged in");

    Ok(Json(json!({
        "token": token.key,
        "id": client.id,
        "full_name": client.full_name(),
        "email": client.email,
    })))
}

pub async fn organization_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<Value>> {
    let user = state
        .store
        .find_organization_user_by_email(&request.email)
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or(invalid_login(BackendKind::OrganizationToken))?;

    let token = state
        .tokens
        .get_or_create(RoleTag::Organization, user.id)
        .await?;
    info!(user_id = user.id, "organization user logged in");

    Ok(Json(json!({
        "token": token.key,
        "id": user.id,
        "organization_id": user.organization_id,
    })))
}

pub async fn donor_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<Value>> {
    let user = state
        .store
        .find_donor_user_by_email(&request.email)
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or(invalid_login(BackendKind::DonorToken))?;

    let token = state.tokens.get_or_create(RoleTag::Donor, user.id).await?;
    info!(user_id = user.id, "donor user logged in");

    Ok(Json(json!({
        "token": token.key,
        "id": user.id,
        "donor_id": user.donor_id,
    })))
}

async fn logout(state: &AppState, context: &Authenticated, role: RoleTag) -> WebResult<Json<Value>> {
    let Authenticated(context) = context;

    if context.role() != role {
        return Err(WebError::forbidden("matching role"));
    }
    let user_id = context
        .user_id()
        .ok_or_else(|| WebError::bad_request("no token for this principal", "no_token"))?;

    if !state.tokens.delete(role, user_id).await? {
        return Err(WebError::bad_request("no token for this principal", "no_token"));
    }

    info!(identity = %context.summary(), "logged out");
    Ok(Json(json!({})))
}

pub async fn nurse_logout(
    State(state): State<AppState>,
    context: Authenticated,
) -> WebResult<Json<Value>> {
    logout(&state, &context, RoleTag::Nurse).await
}

pub async fn client_logout(
    State(state): State<AppState>,
    context: Authenticated,
) -> WebResult<Json<Value>> {
    logout(&state, &context, RoleTag::Client).await
}

pub async fn organization_logout(
    State(state): State<AppState>,
    context: Authenticated,
) -> WebResult<Json<Value>> {
    logout(&state, &context, RoleTag::Organization).await
}

pub async fn donor_logout(
    State(state): State<AppState>,
    context: Authenticated,
) -> WebResult<Json<Value>> {
    logout(&state, &context, RoleTag::Donor).await
}
