//! Nurse endpoints
//!
//! Creation is open (the mobile signup flow) and hands back a signed
//! token so the new nurse can finish its profile before ever logging
//! in. Reads and updates are guarded by the self-or-staff rule.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use carelink_applications::auth::password::hash_password;
use carelink_applications::auth::permissions::is_nurse_self;
use carelink_applications::auth::signed::UPDATE_NURSE_UNAUTHENTICATED;
use carelink_applications::auth::tokens::generate_key;
use carelink_applications::store::{NewNurse, NurseProfileUpdate};
use carelink_applications::Notification;
use carelink_core::{NurseId, Verb};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    error::{WebError, WebResult},
    extract::{auth_request_from_headers, Authenticated},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateNurseRequest {
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub surname: String,
    pub password: String,
}

/// POST /api/nurses. Open creation; duplicate emails are rejected
/// before any write happens.
pub async fn create_nurse(
    State(state): State<AppState>,
    Json(request): Json<CreateNurseRequest>,
) -> WebResult<Json<Value>> {
    if state
        .store
        .find_nurse_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(WebError::bad_request(
            "a nurse with this email already exists",
            "email_exists",
        ));
    }

    let password_hash = hash_password(&request.password)?;
    let nurse = state
        .store
        .create_nurse(NewNurse {
            email: request.email,
            phone: request.phone,
            first_name: request.first_name,
            surname: request.surname,
            password_hash,
        })
        .await?;

    let token = state.signer.mint(
        nurse.id,
        UPDATE_NURSE_UNAUTHENTICATED,
        Duration::from_secs(state.config.signed_token_ttl_secs),
    )?;

    info!(nurse_id = nurse.id, "nurse created");

    Ok(Json(json!({
        "id": nurse.id,
        "email": nurse.email,
        "full_name": nurse.full_name(),
        "token": token,
    })))
}

/// GET /api/nurses/{id}
pub async fn get_nurse(
    State(state): State<AppState>,
    Path(id): Path<NurseId>,
    Authenticated(context): Authenticated,
) -> WebResult<Json<Value>> {
    let nurse = state
        .store
        .get_nurse(id)
        .await?
        .ok_or_else(|| WebError::Care(carelink_core::CareError::not_found("nurse")))?;

    if !is_nurse_self(&context, &nurse) {
        return Err(WebError::forbidden("nurse self"));
    }

    Ok(Json(serde_json::to_value(&nurse).map_err(anyhow::Error::from)?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNurseRequest {
    /// Signed token for the pre-login profile-completion flow.
    pub token: Option<String>,
    #[serde(flatten)]
    pub profile: NurseProfileUpdate,
}

/// PATCH /api/nurses/{id}. Accepts either a normal credential or, for
/// mutations only, the signed profile-completion token in the body.
/// The handler drives authentication itself because only it holds the
/// parsed body.
pub async fn update_nurse(
    State(state): State<AppState>,
    Path(id): Path<NurseId>,
    headers: HeaderMap,
    Json(request): Json<UpdateNurseRequest>,
) -> WebResult<Json<Value>> {
    let mut auth_request = auth_request_from_headers(&headers, Verb::Mutate);
    auth_request.body_token = request.token;

    let context = state.authenticator.authenticate(&auth_request).await?;

    let nurse = state
        .store
        .get_nurse(id)
        .await?
        .ok_or_else(|| WebError::Care(carelink_core::CareError::not_found("nurse")))?;

    if !is_nurse_self(&context, &nurse) {
        return Err(WebError::forbidden("nurse self"));
    }

    let updated = state.store.update_nurse_profile(id, request.profile).await?;
    info!(nurse_id = id, identity = %context.summary(), "nurse profile updated");

    Ok(Json(serde_json::to_value(&updated).map_err(anyhow::Error::from)?))
}

#[derive(Debug, Deserialize)]
pub struct PasswordEmailRequest {
    pub email: String,
    /// "create", "create_admin", or "reset".
    pub email_type: String,
}

/// POST /api/nurses/password-email. Stores a fresh password code and
/// dispatches the email. Delivery is the queue worker's problem.
pub async fn send_password_email(
    State(state): State<AppState>,
    Json(request): Json<PasswordEmailRequest>,
) -> WebResult<Json<Value>> {
    let subject = match request.email_type.as_str() {
        "create" => "Activate your Carelink account",
        "create_admin" => "Download the Carelink app and activate your account",
        "reset" => "Reset your Carelink password",
        other => {
            return Err(WebError::bad_request(
                format!("unknown email type: {}", other),
                "validation_error",
            ))
        }
    };

    let nurse = state
        .store
        .find_nurse_by_email(&request.email)
        .await?
        .ok_or_else(|| WebError::Care(carelink_core::CareError::not_found("nurse")))?;

    let code = generate_key();
    state
        .store
        .set_nurse_password_code(nurse.id, code.clone())
        .await?;

    state.notifier.dispatch(Notification {
        model: "nurse".to_string(),
        recipient: Some(nurse.id),
        messenger: "email".to_string(),
        subject: subject.to_string(),
        body_template: "nurse_set_password".to_string(),
        context: json!({
            "email": request.email,
            "set_password_code": code,
            "email_type": request.email_type,
        }),
    });

    Ok(Json(json!({ "email": request.email })))
}
