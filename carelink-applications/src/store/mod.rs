//! Domain store
//!
//! Persistence for users, reservations, shifts, care logs, and
//! incidents. Two backends behind one enum: `Memory` for tests and
//! development, `Database` (SQLite) for production. Multi-step writes
//! (creating a reservation together with its holder client) are atomic
//! in both.

mod memory;

#[cfg(feature = "sqlite")]
mod database;

pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use database::DatabaseStore;

use carelink_core::{
    CareResult, ClientId, IncidentId, NurseId, ReservationId, ShiftId,
};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Address, CareLogEntry, CareLogView, ClientUser, DonorUser, IncidentView, NurseUser,
    OrganizationUser, Reservation, Shift, ShiftIncident, StaffUser,
};

#[cfg(feature = "sqlite")]
use sqlx::SqlitePool;

/// Fields for a new nurse row.
#[derive(Debug, Clone)]
pub struct NewNurse {
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub surname: String,
    pub password_hash: String,
}

/// Fields for a new client row.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub email: String,
    pub first_name: String,
    pub surname: String,
    pub password_hash: String,
    pub reservation_id: ReservationId,
    pub account_holder: bool,
}

/// Fields for a new staff row.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub email: String,
    pub password_hash: String,
}

/// Fields for a new organization user row.
#[derive(Debug, Clone)]
pub struct NewOrganizationUser {
    pub email: String,
    pub password_hash: String,
    pub organization_id: i64,
}

/// Fields for a new donor user row.
#[derive(Debug, Clone)]
pub struct NewDonorUser {
    pub email: String,
    pub password_hash: String,
    pub donor_id: i64,
}

/// Profile fields a nurse may complete or change about itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NurseProfileUpdate {
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub bank_name: Option<String>,
    pub emergency_contact: Option<String>,
}

/// Fields for a new address row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub reservation_id: ReservationId,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// Fields for a new shift row.
#[derive(Debug, Clone)]
pub struct NewShift {
    pub reservation_id: ReservationId,
    pub nurse_id: Option<NurseId>,
    pub month: String,
    pub status: String,
}

/// Check-in/out mutation on a shift.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftCheckUpdate {
    pub checkin: Option<chrono::DateTime<chrono::Utc>>,
    pub checkout: Option<chrono::DateTime<chrono::Utc>>,
    pub status: Option<String>,
}

/// Fields for a new care log entry.
#[derive(Debug, Clone)]
pub struct NewCareLogEntry {
    pub shift_id: ShiftId,
    pub status: String,
    pub has_observations: bool,
    pub created_by_nurse: bool,
}

/// Fields for a new incident.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub shift_id: ShiftId,
    pub category: i64,
    pub description: String,
}

/// Row scoping applied before permission checks and metrics: which
/// slice of shifts (or shift-attached records) a role may see at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftScope {
    All,
    Nurse(NurseId),
    Reservation(ReservationId),
}

/// Domain store supporting both in-memory and database storage.
#[derive(Debug, Clone)]
pub enum CareStore {
    /// In-memory storage (for development and testing)
    Memory(MemoryStore),
    /// Database storage (for production)
    #[cfg(feature = "sqlite")]
    Database(DatabaseStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $body:expr) => {
        match $self {
            CareStore::Memory($store) => $body,
            #[cfg(feature = "sqlite")]
            CareStore::Database($store) => $body,
        }
    };
}

impl CareStore {
    /// Create an in-memory store.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::default())
    }

    /// Create a database-backed store, bootstrapping its tables.
    #[cfg(feature = "sqlite")]
    pub async fn database(pool: SqlitePool) -> CareResult<Self> {
        Ok(Self::Database(DatabaseStore::new(pool).await?))
    }

    // --- nurses ---

    pub async fn create_nurse(&self, new: NewNurse) -> CareResult<NurseUser> {
        dispatch!(self, store => store.create_nurse(new).await)
    }

    pub async fn get_nurse(&self, id: NurseId) -> CareResult<Option<NurseUser>> {
        dispatch!(self, store => store.get_nurse(id).await)
    }

    pub async fn find_nurse_by_email(&self, email: &str) -> CareResult<Option<NurseUser>> {
        dispatch!(self, store => store.find_nurse_by_email(email).await)
    }

    pub async fn update_nurse_profile(
        &self,
        id: NurseId,
        update: NurseProfileUpdate,
    ) -> CareResult<NurseUser> {
        dispatch!(self, store => store.update_nurse_profile(id, update).await)
    }

    pub async fn set_nurse_password_code(&self, id: NurseId, code: String) -> CareResult<()> {
        dispatch!(self, store => store.set_nurse_password_code(id, code).await)
    }

    // --- clients and reservations ---

    pub async fn create_reservation(&self, status: i64, by_admin: bool) -> CareResult<Reservation> {
        dispatch!(self, store => store.create_reservation(status, by_admin).await)
    }

    pub async fn create_client(&self, new: NewClient) -> CareResult<ClientUser> {
        dispatch!(self, store => store.create_client(new).await)
    }

    /// Create a reservation and its holder client as one atomic write.
    pub async fn create_account(
        &self,
        email: String,
        first_name: String,
        surname: String,
        password_hash: String,
    ) -> CareResult<(Reservation, ClientUser)> {
        dispatch!(self, store => {
            store
                .create_account(email, first_name, surname, password_hash)
                .await
        })
    }

    pub async fn get_client(&self, id: ClientId) -> CareResult<Option<ClientUser>> {
        dispatch!(self, store => store.get_client(id).await)
    }

    pub async fn find_client_by_email(&self, email: &str) -> CareResult<Option<ClientUser>> {
        dispatch!(self, store => store.find_client_by_email(email).await)
    }

    pub async fn create_address(&self, new: NewAddress) -> CareResult<Address> {
        dispatch!(self, store => store.create_address(new).await)
    }

    // --- staff ---

    pub async fn create_staff(&self, new: NewStaff) -> CareResult<StaffUser> {
        dispatch!(self, store => store.create_staff(new).await)
    }

    pub async fn get_staff(&self, id: i64) -> CareResult<Option<StaffUser>> {
        dispatch!(self, store => store.get_staff(id).await)
    }

    // --- organization and donor users ---

    pub async fn create_organization_user(
        &self,
        new: NewOrganizationUser,
    ) -> CareResult<OrganizationUser> {
        dispatch!(self, store => store.create_organization_user(new).await)
    }

    pub async fn get_organization_user(&self, id: i64) -> CareResult<Option<OrganizationUser>> {
        dispatch!(self, store => store.get_organization_user(id).await)
    }

    pub async fn find_organization_user_by_email(
        &self,
        email: &str,
    ) -> CareResult<Option<OrganizationUser>> {
        dispatch!(self, store => store.find_organization_user_by_email(email).await)
    }

    pub async fn list_organization_users(&self) -> CareResult<Vec<OrganizationUser>> {
        dispatch!(self, store => store.list_organization_users().await)
    }

    pub async fn create_donor_user(&self, new: NewDonorUser) -> CareResult<DonorUser> {
        dispatch!(self, store => store.create_donor_user(new).await)
    }

    pub async fn get_donor_user(&self, id: i64) -> CareResult<Option<DonorUser>> {
        dispatch!(self, store => store.get_donor_user(id).await)
    }

    pub async fn find_donor_user_by_email(&self, email: &str) -> CareResult<Option<DonorUser>> {
        dispatch!(self, store => store.find_donor_user_by_email(email).await)
    }

    // --- shifts ---

    pub async fn create_shift(&self, new: NewShift) -> CareResult<Shift> {
        dispatch!(self, store => store.create_shift(new).await)
    }

    pub async fn get_shift(&self, id: ShiftId) -> CareResult<Option<Shift>> {
        dispatch!(self, store => store.get_shift(id).await)
    }

    pub async fn list_shifts(&self, scope: ShiftScope) -> CareResult<Vec<Shift>> {
        dispatch!(self, store => store.list_shifts(scope).await)
    }

    pub async fn record_shift_check(
        &self,
        id: ShiftId,
        update: ShiftCheckUpdate,
    ) -> CareResult<Shift> {
        dispatch!(self, store => store.record_shift_check(id, update).await)
    }

    /// Assign an unassigned shift to a nurse. Assigning an already
    /// assigned shift is an integrity conflict.
    pub async fn claim_shift(&self, id: ShiftId, nurse_id: NurseId) -> CareResult<Shift> {
        dispatch!(self, store => store.claim_shift(id, nurse_id).await)
    }

    // --- care logs ---

    pub async fn create_care_log_entry(&self, new: NewCareLogEntry) -> CareResult<CareLogEntry> {
        dispatch!(self, store => store.create_care_log_entry(new).await)
    }

    pub async fn list_care_logs(&self, scope: ShiftScope) -> CareResult<Vec<CareLogView>> {
        dispatch!(self, store => store.list_care_logs(scope).await)
    }

    // --- incidents ---

    pub async fn create_incident(&self, new: NewIncident) -> CareResult<ShiftIncident> {
        dispatch!(self, store => store.create_incident(new).await)
    }

    pub async fn get_incident(&self, id: IncidentId) -> CareResult<Option<IncidentView>> {
        dispatch!(self, store => store.get_incident(id).await)
    }
}
