//! Object permissions
//!
//! A small family of predicates composed per endpoint. Each predicate
//! dispatches on the authenticated role tag, inspects an ownership
//! relationship, and falls back to the staff override last: staff
//! always wins, and a missing relationship denies instead of erroring.
//!
//! There is deliberately no single rule for whether a client may touch
//! another client's records: `has_client` grants any same-reservation
//! client, while `is_client_self` grants only the record's own client or
//! the reservation's account holder, and creation under
//! `is_account_holder` is holder-only. Endpoints pick the predicate that
//! matches their record type.

use carelink_core::{NurseId, ReservationId};

use crate::domain::{ClientUser, NurseUser};

use super::identity::AuthContext;

/// Incident categories nurses are allowed to see. Everything else is
/// staff-only, evaluated per object because one endpoint serves both.
pub const READABLE_NURSE_INCIDENT_CATEGORIES: &[i64] = &[0, 1, 2, 7];

/// A record that may be owned by a nurse.
pub trait NurseOwned {
    fn nurse_id(&self) -> Option<NurseId>;
}

/// A record that belongs to a reservation.
pub trait ReservationScoped {
    fn reservation_id(&self) -> Option<ReservationId>;
}

/// A record attached to a shift, exposing the shift's assigned nurse.
pub trait ShiftAssigned {
    fn assigned_nurse_id(&self) -> Option<NurseId>;
}

/// A record carrying a visibility category.
pub trait Categorized {
    fn category(&self) -> Option<i64>;
}

/// Allow staff, or the nurse the object is assigned to.
pub fn has_nurse_owner<T: NurseOwned>(ctx: &AuthContext, obj: &T) -> bool {
    if let Some(nurse) = ctx.nurse() {
        return obj.nurse_id() == Some(nurse.id);
    }
    ctx.is_staff()
}

/// Allow staff, or a nurse when the object has no assigned nurse yet
/// (claiming an unassigned record).
pub fn has_no_nurse_owner<T: NurseOwned>(ctx: &AuthContext, obj: &T) -> bool {
    if ctx.nurse().is_some() {
        return obj.nurse_id().is_none();
    }
    ctx.is_staff()
}

/// Allow staff, or a nurse acting on its own record.
pub fn is_nurse_self(ctx: &AuthContext, obj: &NurseUser) -> bool {
    if let Some(nurse) = ctx.nurse() {
        return obj.id == nurse.id;
    }
    ctx.is_staff()
}

/// Allow staff, or a nurse when the object's category is in the
/// readable allow-list.
pub fn is_readable_incident_category<T: Categorized>(ctx: &AuthContext, obj: &T) -> bool {
    if ctx.nurse().is_some() {
        return match obj.category() {
            Some(category) => READABLE_NURSE_INCIDENT_CATEGORIES.contains(&category),
            None => false,
        };
    }
    ctx.is_staff()
}

/// Allow staff, or the nurse assigned to the shift the object hangs off.
pub fn has_shift_with_nurse_owner<T: ShiftAssigned>(ctx: &AuthContext, obj: &T) -> bool {
    if let Some(nurse) = ctx.nurse() {
        return obj.assigned_nurse_id() == Some(nurse.id);
    }
    ctx.is_staff()
}

/// Allow staff, or a client acting on itself, except that the account
/// holder may act on any client in its reservation.
pub fn is_client_self(ctx: &AuthContext, obj: &ClientUser) -> bool {
    if let Some(client) = ctx.client() {
        if client.account_holder {
            return obj.reservation_id == client.reservation_id;
        }
        return obj.id == client.id;
    }
    ctx.is_staff()
}

/// Allow staff, or a client that is its reservation's account holder.
/// Guards creation endpoints, where there is no object to inspect yet.
pub fn is_account_holder(ctx: &AuthContext) -> bool {
    if let Some(client) = ctx.client() {
        return client.account_holder;
    }
    ctx.is_staff()
}

/// Allow staff, or any client whose reservation contains the object.
/// Used together with [`is_account_holder`] on holder-gated resources.
pub fn has_client_owner<T: ReservationScoped>(ctx: &AuthContext, obj: &T) -> bool {
    if let Some(client) = ctx.client() {
        return obj.reservation_id() == Some(client.reservation_id);
    }
    ctx.is_staff()
}

/// Allow staff, or the assigned nurse, or any client whose reservation
/// contains the object.
pub fn has_owner<T: NurseOwned + ReservationScoped>(ctx: &AuthContext, obj: &T) -> bool {
    if let Some(nurse) = ctx.nurse() {
        return obj.nurse_id() == Some(nurse.id);
    }
    if let Some(client) = ctx.client() {
        return obj.reservation_id() == Some(client.reservation_id);
    }
    ctx.is_staff()
}

/// Allow staff, or any client whose reservation contains the object.
/// Holder status is irrelevant here: reservation membership governs.
pub fn has_client<T: ReservationScoped>(ctx: &AuthContext, obj: &T) -> bool {
    if let Some(client) = ctx.client() {
        return obj.reservation_id() == Some(client.reservation_id);
    }
    ctx.is_staff()
}
