//! Domain records
//!
//! The user populations and the care-operations records their
//! permissions and metrics are evaluated against. These are plain data
//! rows; persistence lives in [`crate::store`].

use carelink_core::{
    CareLogEntryId, ClientId, DonorUserId, IncidentId, NurseId, OrganizationUserId, ReservationId,
    ShiftId, StaffId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::permissions::{Categorized, NurseOwned, ReservationScoped, ShiftAssigned};

/// A nurse. Owns shifts; may complete profile fields before first login
/// through the signed-token flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurseUser {
    pub id: NurseId,
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub surname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub set_password_code: Option<String>,
    pub bank_name: Option<String>,
    pub emergency_contact: Option<String>,
    pub created: DateTime<Utc>,
}

impl NurseUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// A client user. Belongs to exactly one reservation; at most one client
/// per reservation is the account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientUser {
    pub id: ClientId,
    pub email: String,
    pub first_name: String,
    pub surname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub set_password_code: Option<String>,
    pub reservation_id: ReservationId,
    pub account_holder: bool,
    pub created: DateTime<Utc>,
}

impl ClientUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// Back-office staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: StaffId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created: DateTime<Utc>,
}

/// A user belonging to a civic organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationUser {
    pub id: OrganizationUserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub organization_id: i64,
    pub created: DateTime<Utc>,
}

/// A user belonging to a donor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorUser {
    pub id: DonorUserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub donor_id: i64,
    pub created: DateTime<Utc>,
}

/// A care account. Clients attach to it; shifts run against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub status: i64,
    pub by_admin: bool,
    pub created: DateTime<Utc>,
}

/// A scheduled shift. `nurse_id` is null while the shift is unassigned
/// and claimable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub reservation_id: ReservationId,
    pub nurse_id: Option<NurseId>,
    /// Calendar month the shift belongs to, `YYYY-MM`.
    pub month: String,
    pub status: String,
    pub checkin: Option<DateTime<Utc>>,
    pub checkout: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

impl NurseOwned for Shift {
    fn nurse_id(&self) -> Option<NurseId> {
        self.nurse_id
    }
}

impl ReservationScoped for Shift {
    fn reservation_id(&self) -> Option<ReservationId> {
        Some(self.reservation_id)
    }
}

/// One task entry in a shift's care log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareLogEntry {
    pub id: CareLogEntryId,
    pub shift_id: ShiftId,
    pub status: String,
    pub has_observations: bool,
    pub created_by_nurse: bool,
    pub created: DateTime<Utc>,
}

/// A care log entry joined with its shift's scope columns, as the
/// permission predicates and metrics dimensions need them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareLogView {
    #[serde(flatten)]
    pub entry: CareLogEntry,
    pub shift_month: String,
    pub shift_nurse_id: Option<NurseId>,
    pub shift_reservation_id: ReservationId,
}

impl ShiftAssigned for CareLogView {
    fn assigned_nurse_id(&self) -> Option<NurseId> {
        self.shift_nurse_id
    }
}

impl ReservationScoped for CareLogView {
    fn reservation_id(&self) -> Option<ReservationId> {
        Some(self.shift_reservation_id)
    }
}

/// A care address attached to a reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub reservation_id: ReservationId,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub created: DateTime<Utc>,
}

impl ReservationScoped for Address {
    fn reservation_id(&self) -> Option<ReservationId> {
        Some(self.reservation_id)
    }
}

/// An incident reported against a shift. Categories outside the
/// nurse-readable allow-list are visible to staff only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftIncident {
    pub id: IncidentId,
    pub shift_id: ShiftId,
    pub category: i64,
    pub description: String,
    pub created: DateTime<Utc>,
}

/// An incident joined with its shift's scope columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentView {
    #[serde(flatten)]
    pub incident: ShiftIncident,
    pub shift_nurse_id: Option<NurseId>,
    pub shift_reservation_id: ReservationId,
}

impl Categorized for IncidentView {
    fn category(&self) -> Option<i64> {
        Some(self.incident.category)
    }
}

impl ShiftAssigned for IncidentView {
    fn assigned_nurse_id(&self) -> Option<NurseId> {
        self.shift_nurse_id
    }
}

impl ReservationScoped for IncidentView {
    fn reservation_id(&self) -> Option<ReservationId> {
        Some(self.shift_reservation_id)
    }
}
