//! Shift endpoints
//!
//! Listing is role-scoped before anything else; object access is then
//! decided per shift: owner-or-account for reads, owning nurse for
//! check-in/out mutations, no-owner-yet for claiming.

use axum::{
    extract::{Path, State},
    Json,
};
use carelink_applications::auth::permissions::{has_no_nurse_owner, has_nurse_owner, has_owner};
use carelink_applications::store::ShiftCheckUpdate;
use carelink_core::{CareError, NurseId, ShiftId};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::{
    error::{WebError, WebResult},
    extract::Authenticated,
    handlers::shift_scope_for,
    state::AppState,
};

/// GET /api/shifts
pub async fn list_shifts(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
) -> WebResult<Json<Value>> {
    let scope = shift_scope_for(&context)?;
    let shifts = state.store.list_shifts(scope).await?;

    Ok(Json(
        serde_json::to_value(&shifts).map_err(anyhow::Error::from)?,
    ))
}

/// GET /api/shifts/{id}
pub async fn get_shift(
    State(state): State<AppState>,
    Path(id): Path<ShiftId>,
    Authenticated(context): Authenticated,
) -> WebResult<Json<Value>> {
    let shift = state
        .store
        .get_shift(id)
        .await?
        .ok_or_else(|| WebError::Care(CareError::not_found("shift")))?;

    if !has_owner(&context, &shift) {
        return Err(WebError::forbidden("shift owner"));
    }

    Ok(Json(
        serde_json::to_value(&shift).map_err(anyhow::Error::from)?,
    ))
}

/// PATCH /api/shifts/{id}: check-in/out; owning nurse or staff.
pub async fn update_shift(
    State(state): State<AppState>,
    Path(id): Path<ShiftId>,
    Authenticated(context): Authenticated,
    Json(update): Json<ShiftCheckUpdate>,
) -> WebResult<Json<Value>> {
    let shift = state
        .store
        .get_shift(id)
        .await?
        .ok_or_else(|| WebError::Care(CareError::not_found("shift")))?;

    if !has_nurse_owner(&context, &shift) {
        return Err(WebError::forbidden("owning nurse"));
    }

    let updated = state.store.record_shift_check(id, update).await?;
    info!(shift_id = id, identity = %context.summary(), "shift check recorded");

    Ok(Json(
        serde_json::to_value(&updated).map_err(anyhow::Error::from)?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimShiftRequest {
    /// Target nurse when staff claims on a nurse's behalf.
    pub nurse_id: Option<NurseId>,
}

/// POST /api/shifts/{id}/claim: only unassigned shifts are claimable.
pub async fn claim_shift(
    State(state): State<AppState>,
    Path(id): Path<ShiftId>,
    Authenticated(context): Authenticated,
    Json(request): Json<ClaimShiftRequest>,
) -> WebResult<Json<Value>> {
    let shift = state
        .store
        .get_shift(id)
        .await?
        .ok_or_else(|| WebError::Care(CareError::not_found("shift")))?;

    if !has_no_nurse_owner(&context, &shift) {
        return Err(WebError::forbidden("unassigned shift"));
    }

    let nurse_id = match context.nurse() {
        Some(nurse) => nurse.id,
        None => request.nurse_id.ok_or_else(|| {
            WebError::Care(CareError::validation_field("nurse_id is required", "nurse_id"))
        })?,
    };

    let claimed = state.store.claim_shift(id, nurse_id).await?;
    info!(shift_id = id, nurse_id, "shift claimed");

    Ok(Json(
        serde_json::to_value(&claimed).map_err(anyhow::Error::from)?,
    ))
}
