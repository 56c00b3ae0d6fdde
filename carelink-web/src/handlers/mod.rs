//! Request handlers

pub mod auth;
pub mod clients;
pub mod incidents;
pub mod internal;
pub mod metrics;
pub mod nurses;
pub mod shifts;

use carelink_applications::store::ShiftScope;
use carelink_applications::{AuthContext, RoleTag};

use crate::error::WebError;

/// Which slice of shift-attached records a role may see. Organization
/// and donor users have no footing in the care domain at all.
pub(crate) fn shift_scope_for(context: &AuthContext) -> Result<ShiftScope, WebError> {
    match context.role() {
        RoleTag::Nurse => {
            let nurse = context.nurse().ok_or(WebError::forbidden("nurse"))?;
            Ok(ShiftScope::Nurse(nurse.id))
        }
        RoleTag::Client => {
            let client = context.client().ok_or(WebError::forbidden("client"))?;
            Ok(ShiftScope::Reservation(client.reservation_id))
        }
        RoleTag::Staff | RoleTag::Internal => Ok(ShiftScope::All),
        RoleTag::Organization | RoleTag::Donor => Err(WebError::forbidden("care domain role")),
    }
}
