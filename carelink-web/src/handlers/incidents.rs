//! Incident endpoints
//!
//! One endpoint serves every category, so visibility is decided per
//! object: nurses see their own shifts' incidents only when the
//! category is allow-listed; staff see everything.

use axum::{
    extract::{Path, State},
    Json,
};
use carelink_applications::auth::permissions::{
    has_shift_with_nurse_owner, is_readable_incident_category,
};
use carelink_core::{CareError, IncidentId};
use serde_json::Value;

use crate::{
    error::{WebError, WebResult},
    extract::Authenticated,
    state::AppState,
};

/// GET /api/incidents/{id}
pub async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<IncidentId>,
    Authenticated(context): Authenticated,
) -> WebResult<Json<Value>> {
    let incident = state
        .store
        .get_incident(id)
        .await?
        .ok_or_else(|| WebError::Care(CareError::not_found("incident")))?;

    if !has_shift_with_nurse_owner(&context, &incident) {
        return Err(WebError::forbidden("incident shift owner"));
    }
    if !is_readable_incident_category(&context, &incident) {
        return Err(WebError::forbidden("readable incident category"));
    }

    Ok(Json(
        serde_json::to_value(&incident).map_err(anyhow::Error::from)?,
    ))
}
