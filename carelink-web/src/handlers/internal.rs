//! Internal service endpoints
//!
//! Reachable only by in-house processes presenting the shared secret.

use axum::{extract::State, Json};
use serde_json::Value;

use crate::{error::WebResult, extract::RequireInternal, state::AppState};

/// GET /api/internal/organization-users
pub async fn list_organization_users(
    State(state): State<AppState>,
    RequireInternal(_context): RequireInternal,
) -> WebResult<Json<Value>> {
    let users = state.store.list_organization_users().await?;

    Ok(Json(
        serde_json::to_value(&users).map_err(anyhow::Error::from)?,
    ))
}
