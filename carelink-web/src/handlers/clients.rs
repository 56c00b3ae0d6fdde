//! Client and account endpoints
//!
//! Account creation builds the reservation and its holder client in one
//! transaction, notifies staff, and hands back a signed token so the
//! signup flow can attach addresses before the first login.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use carelink_applications::auth::password::hash_password;
use carelink_applications::auth::permissions::is_client_self;
use carelink_applications::auth::signed::ACCOUNT_CREATE_UNAUTHENTICATED;
use carelink_applications::store::NewAddress;
use carelink_applications::Notification;
use carelink_core::ClientId;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    error::{WebError, WebResult},
    extract::Authenticated,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub first_name: String,
    pub surname: String,
    pub password: String,
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> WebResult<Json<Value>> {
    if state
        .store
        .find_client_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(WebError::bad_request(
            "a user with this email already exists",
            "email_exists",
        ));
    }

    let password_hash = hash_password(&request.password)?;
    let (reservation, client) = state
        .store
        .create_account(
            request.email,
            request.first_name,
            request.surname,
            password_hash,
        )
        .await?;

    state.notifier.dispatch(Notification {
        model: "staff".to_string(),
        recipient: None,
        messenger: "email".to_string(),
        subject: "New client account".to_string(),
        body_template: "generic_body".to_string(),
        context: json!({
            "body_content": format!(
                "{} just created a new account. Their email is {}.",
                client.full_name(),
                client.email,
            ),
        }),
    });

    let token = state.signer.mint(
        reservation.id,
        ACCOUNT_CREATE_UNAUTHENTICATED,
        Duration::from_secs(state.config.signed_token_ttl_secs),
    )?;

    info!(
        client_id = client.id,
        reservation_id = reservation.id,
        "client account created"
    );

    Ok(Json(json!({
        "id": client.id,
        "reservation_id": reservation.id,
        "token": token,
    })))
}

/// GET /api/clients/{id}: self, or any sibling for the account holder,
/// or staff.
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    Authenticated(context): Authenticated,
) -> WebResult<Json<Value>> {
    let client = state
        .store
        .get_client(id)
        .await?
        .ok_or_else(|| WebError::Care(carelink_core::CareError::not_found("client")))?;

    if !is_client_self(&context, &client) {
        return Err(WebError::forbidden("client self"));
    }

    Ok(Json(
        serde_json::to_value(&client).map_err(anyhow::Error::from)?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UnauthenticatedAddressRequest {
    /// Signed account-creation token.
    pub token: String,
    #[serde(flatten)]
    pub address: NewAddress,
}

/// POST /api/addresses/unauthenticated, guarded solely by the signed
/// account-creation token, whose subject must be the posted
/// reservation.
pub async fn create_address_unauthenticated(
    State(state): State<AppState>,
    Json(request): Json<UnauthenticatedAddressRequest>,
) -> WebResult<Json<Value>> {
    let reservation_id = state
        .signer
        .verify(&request.token, ACCOUNT_CREATE_UNAUTHENTICATED)?;

    if reservation_id != request.address.reservation_id {
        return Err(WebError::bad_request("incorrect account", "incorrect_account"));
    }

    let address = state.store.create_address(request.address).await?;
    info!(
        address_id = address.id,
        reservation_id, "address created through signup flow"
    );

    Ok(Json(
        serde_json::to_value(&address).map_err(anyhow::Error::from)?,
    ))
}
