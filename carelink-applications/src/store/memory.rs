//! In-memory store backend

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use carelink_core::{
    CareError, CareResult, ClientId, IncidentId, NurseId, ReservationId, ShiftId,
};
use chrono::Utc;

use crate::domain::{
    Address, CareLogEntry, CareLogView, ClientUser, DonorUser, IncidentView, NurseUser,
    OrganizationUser, Reservation, Shift, ShiftIncident, StaffUser,
};

use super::{
    NewAddress, NewCareLogEntry, NewClient, NewDonorUser, NewIncident, NewNurse,
    NewOrganizationUser, NewShift, NewStaff, NurseProfileUpdate, ShiftCheckUpdate, ShiftScope,
};

/// Per-table row id counter, matching the database backend's
/// autoincrement columns.
#[derive(Debug, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    nurse_seq: Sequence,
    client_seq: Sequence,
    staff_seq: Sequence,
    organization_user_seq: Sequence,
    donor_user_seq: Sequence,
    reservation_seq: Sequence,
    address_seq: Sequence,
    shift_seq: Sequence,
    care_log_seq: Sequence,
    incident_seq: Sequence,
    nurses: HashMap<NurseId, NurseUser>,
    clients: HashMap<ClientId, ClientUser>,
    staff: HashMap<i64, StaffUser>,
    organization_users: HashMap<i64, OrganizationUser>,
    donor_users: HashMap<i64, DonorUser>,
    reservations: HashMap<ReservationId, Reservation>,
    addresses: HashMap<i64, Address>,
    shifts: HashMap<ShiftId, Shift>,
    care_logs: HashMap<i64, CareLogEntry>,
    incidents: HashMap<IncidentId, ShiftIncident>,
}

/// In-memory domain store. All writes take the single inner lock, which
/// also gives the multi-step account creation its atomicity.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    fn write(&self) -> CareResult<RwLockWriteGuard<'_, MemoryInner>> {
        self.inner
            .write()
            .map_err(|_| CareError::internal("store lock poisoned"))
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryInner) -> T) -> CareResult<T> {
        let inner = self
            .inner
            .read()
            .map_err(|_| CareError::internal("store lock poisoned"))?;
        Ok(f(&inner))
    }

    // --- nurses ---

    pub async fn create_nurse(&self, new: NewNurse) -> CareResult<NurseUser> {
        let mut inner = self.write()?;
        if inner.nurses.values().any(|n| n.email == new.email) {
            return Err(CareError::integrity("duplicate nurse email"));
        }
        let id = inner.nurse_seq.next();
        let nurse = NurseUser {
            id,
            email: new.email,
            phone: new.phone,
            first_name: new.first_name,
            surname: new.surname,
            password_hash: new.password_hash,
            set_password_code: None,
            bank_name: None,
            emergency_contact: None,
            created: Utc::now(),
        };
        inner.nurses.insert(id, nurse.clone());
        Ok(nurse)
    }

    pub async fn get_nurse(&self, id: NurseId) -> CareResult<Option<NurseUser>> {
        self.read(|inner| inner.nurses.get(&id).cloned())
    }

    pub async fn find_nurse_by_email(&self, email: &str) -> CareResult<Option<NurseUser>> {
        self.read(|inner| inner.nurses.values().find(|n| n.email == email).cloned())
    }

    pub async fn update_nurse_profile(
        &self,
        id: NurseId,
        update: NurseProfileUpdate,
    ) -> CareResult<NurseUser> {
        let mut inner = self.write()?;
        let nurse = inner
            .nurses
            .get_mut(&id)
            .ok_or_else(|| CareError::not_found("nurse"))?;

        if let Some(phone) = update.phone {
            nurse.phone = Some(phone);
        }
        if let Some(first_name) = update.first_name {
            nurse.first_name = first_name;
        }
        if let Some(surname) = update.surname {
            nurse.surname = surname;
        }
        if let Some(bank_name) = update.bank_name {
            nurse.bank_name = Some(bank_name);
        }
        if let Some(emergency_contact) = update.emergency_contact {
            nurse.emergency_contact = Some(emergency_contact);
        }
        Ok(nurse.clone())
    }

    pub async fn set_nurse_password_code(&self, id: NurseId, code: String) -> CareResult<()> {
        let mut inner = self.write()?;
        let nurse = inner
            .nurses
            .get_mut(&id)
            .ok_or_else(|| CareError::not_found("nurse"))?;
        nurse.set_password_code = Some(code);
        Ok(())
    }

    // --- clients and reservations ---

    pub async fn create_reservation(
        &self,
        status: i64,
        by_admin: bool,
    ) -> CareResult<Reservation> {
        let mut inner = self.write()?;
        let id = inner.reservation_seq.next();
        let reservation = Reservation {
            id,
            status,
            by_admin,
            created: Utc::now(),
        };
        inner.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    pub async fn create_client(&self, new: NewClient) -> CareResult<ClientUser> {
        let mut inner = self.write()?;
        Self::insert_client(&mut inner, new)
    }

    fn insert_client(inner: &mut MemoryInner, new: NewClient) -> CareResult<ClientUser> {
        if inner.clients.values().any(|c| c.email == new.email) {
            return Err(CareError::integrity("duplicate client email"));
        }
        if !inner.reservations.contains_key(&new.reservation_id) {
            return Err(CareError::not_found("reservation"));
        }
        let id = inner.client_seq.next();
        let client = ClientUser {
            id,
            email: new.email,
            first_name: new.first_name,
            surname: new.surname,
            password_hash: new.password_hash,
            set_password_code: None,
            reservation_id: new.reservation_id,
            account_holder: new.account_holder,
            created: Utc::now(),
        };
        inner.clients.insert(id, client.clone());
        Ok(client)
    }

    pub async fn create_account(
        &self,
        email: String,
        first_name: String,
        surname: String,
        password_hash: String,
    ) -> CareResult<(Reservation, ClientUser)> {
        // One lock acquisition covers both writes, so a duplicate email
        // leaves no orphaned reservation behind.
        let mut inner = self.write()?;
        if inner.clients.values().any(|c| c.email == email) {
            return Err(CareError::integrity("duplicate client email"));
        }

        let reservation_id = inner.reservation_seq.next();
        let reservation = Reservation {
            id: reservation_id,
            status: 0,
            by_admin: false,
            created: Utc::now(),
        };
        inner.reservations.insert(reservation_id, reservation.clone());

        let client = Self::insert_client(
            &mut inner,
            NewClient {
                email,
                first_name,
                surname,
                password_hash,
                reservation_id,
                account_holder: true,
            },
        )?;

        Ok((reservation, client))
    }

    pub async fn get_client(&self, id: ClientId) -> CareResult<Option<ClientUser>> {
        self.read(|inner| inner.clients.get(&id).cloned())
    }

    pub async fn find_client_by_email(&self, email: &str) -> CareResult<Option<ClientUser>> {
        self.read(|inner| inner.clients.values().find(|c| c.email == email).cloned())
    }

    pub async fn create_address(&self, new: NewAddress) -> CareResult<Address> {
        let mut inner = self.write()?;
        if !inner.reservations.contains_key(&new.reservation_id) {
            return Err(CareError::not_found("reservation"));
        }
        let id = inner.address_seq.next();
        let address = Address {
            id,
            reservation_id: new.reservation_id,
            street: new.street,
            city: new.city,
            postal_code: new.postal_code,
            created: Utc::now(),
        };
        inner.addresses.insert(id, address.clone());
        Ok(address)
    }

    // --- staff ---

    pub async fn create_staff(&self, new: NewStaff) -> CareResult<StaffUser> {
        let mut inner = self.write()?;
        if inner.staff.values().any(|s| s.email == new.email) {
            return Err(CareError::integrity("duplicate staff email"));
        }
        let id = inner.staff_seq.next();
        let staff = StaffUser {
            id,
            email: new.email,
            password_hash: new.password_hash,
            is_staff: true,
            created: Utc::now(),
        };
        inner.staff.insert(id, staff.clone());
        Ok(staff)
    }

    pub async fn get_staff(&self, id: i64) -> CareResult<Option<StaffUser>> {
        self.read(|inner| inner.staff.get(&id).cloned())
    }

    // --- organization and donor users ---

    pub async fn create_organization_user(
        &self,
        new: NewOrganizationUser,
    ) -> CareResult<OrganizationUser> {
        let mut inner = self.write()?;
        if inner.organization_users.values().any(|u| u.email == new.email) {
            return Err(CareError::integrity("duplicate organization user email"));
        }
        let id = inner.organization_user_seq.next();
        let user = OrganizationUser {
            id,
            email: new.email,
            password_hash: new.password_hash,
            organization_id: new.organization_id,
            created: Utc::now(),
        };
        inner.organization_users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn get_organization_user(&self, id: i64) -> CareResult<Option<OrganizationUser>> {
        self.read(|inner| inner.organization_users.get(&id).cloned())
    }

    pub async fn find_organization_user_by_email(
        &self,
        email: &str,
    ) -> CareResult<Option<OrganizationUser>> {
        self.read(|inner| {
            inner
                .organization_users
                .values()
                .find(|u| u.email == email)
                .cloned()
        })
    }

    pub async fn list_organization_users(&self) -> CareResult<Vec<OrganizationUser>> {
        self.read(|inner| {
            let mut users: Vec<_> = inner.organization_users.values().cloned().collect();
            users.sort_by_key(|u| u.id);
            users
        })
    }

    pub async fn create_donor_user(&self, new: NewDonorUser) -> CareResult<DonorUser> {
        let mut inner = self.write()?;
        if inner.donor_users.values().any(|u| u.email == new.email) {
            return Err(CareError::integrity("duplicate donor user email"));
        }
        let id = inner.donor_user_seq.next();
        let user = DonorUser {
            id,
            email: new.email,
            password_hash: new.password_hash,
            donor_id: new.donor_id,
            created: Utc::now(),
        };
        inner.donor_users.insert(id, user.clone());
        Ok(user)
    }

    pub async fn get_donor_user(&self, id: i64) -> CareResult<Option<DonorUser>> {
        self.read(|inner| inner.donor_users.get(&id).cloned())
    }

    pub async fn find_donor_user_by_email(&self, email: &str) -> CareResult<Option<DonorUser>> {
        self.read(|inner| {
            inner
                .donor_users
                .values()
                .find(|u| u.email == email)
                .cloned()
        })
    }

    // --- shifts ---

    pub async fn create_shift(&self, new: NewShift) -> CareResult<Shift> {
        let mut inner = self.write()?;
        if !inner.reservations.contains_key(&new.reservation_id) {
            return Err(CareError::not_found("reservation"));
        }
        let id = inner.shift_seq.next();
        let shift = Shift {
            id,
            reservation_id: new.reservation_id,
            nurse_id: new.nurse_id,
            month: new.month,
            status: new.status,
            checkin: None,
            checkout: None,
            created: Utc::now(),
        };
        inner.shifts.insert(id, shift.clone());
        Ok(shift)
    }

    pub async fn get_shift(&self, id: ShiftId) -> CareResult<Option<Shift>> {
        self.read(|inner| inner.shifts.get(&id).cloned())
    }

    pub async fn list_shifts(&self, scope: ShiftScope) -> CareResult<Vec<Shift>> {
        self.read(|inner| {
            let mut shifts: Vec<_> = inner
                .shifts
                .values()
                .filter(|shift| match scope {
                    ShiftScope::All => true,
                    ShiftScope::Nurse(nurse_id) => shift.nurse_id == Some(nurse_id),
                    ShiftScope::Reservation(reservation_id) => {
                        shift.reservation_id == reservation_id
                    }
                })
                .cloned()
                .collect();
            shifts.sort_by_key(|s| s.id);
            shifts
        })
    }

    pub async fn record_shift_check(
        &self,
        id: ShiftId,
        update: ShiftCheckUpdate,
    ) -> CareResult<Shift> {
        let mut inner = self.write()?;
        let shift = inner
            .shifts
            .get_mut(&id)
            .ok_or_else(|| CareError::not_found("shift"))?;

        if let Some(checkin) = update.checkin {
            shift.checkin = Some(checkin);
        }
        if let Some(checkout) = update.checkout {
            shift.checkout = Some(checkout);
        }
        if let Some(status) = update.status {
            shift.status = status;
        }
        Ok(shift.clone())
    }

    pub async fn claim_shift(&self, id: ShiftId, nurse_id: NurseId) -> CareResult<Shift> {
        let mut inner = self.write()?;
        let shift = inner
            .shifts
            .get_mut(&id)
            .ok_or_else(|| CareError::not_found("shift"))?;

        if shift.nurse_id.is_some() {
            return Err(CareError::integrity("shift already assigned"));
        }
        shift.nurse_id = Some(nurse_id);
        Ok(shift.clone())
    }

    // --- care logs ---

    pub async fn create_care_log_entry(&self, new: NewCareLogEntry) -> CareResult<CareLogEntry> {
        let mut inner = self.write()?;
        if !inner.shifts.contains_key(&new.shift_id) {
            return Err(CareError::not_found("shift"));
        }
        let id = inner.care_log_seq.next();
        let entry = CareLogEntry {
            id,
            shift_id: new.shift_id,
            status: new.status,
            has_observations: new.has_observations,
            created_by_nurse: new.created_by_nurse,
            created: Utc::now(),
        };
        inner.care_logs.insert(id, entry.clone());
        Ok(entry)
    }

    pub async fn list_care_logs(&self, scope: ShiftScope) -> CareResult<Vec<CareLogView>> {
        self.read(|inner| {
            let mut views: Vec<_> = inner
                .care_logs
                .values()
                .filter_map(|entry| {
                    let shift = inner.shifts.get(&entry.shift_id)?;
                    let in_scope = match scope {
                        ShiftScope::All => true,
                        ShiftScope::Nurse(nurse_id) => shift.nurse_id == Some(nurse_id),
                        ShiftScope::Reservation(reservation_id) => {
                            shift.reservation_id == reservation_id
                        }
                    };
                    in_scope.then(|| CareLogView {
                        entry: entry.clone(),
                        shift_month: shift.month.clone(),
                        shift_nurse_id: shift.nurse_id,
                        shift_reservation_id: shift.reservation_id,
                    })
                })
                .collect();
            views.sort_by_key(|v| v.entry.id);
            views
        })
    }

    // --- incidents ---

    pub async fn create_incident(&self, new: NewIncident) -> CareResult<ShiftIncident> {
        let mut inner = self.write()?;
        if !inner.shifts.contains_key(&new.shift_id) {
            return Err(CareError::not_found("shift"));
        }
        let id = inner.incident_seq.next();
        let incident = ShiftIncident {
            id,
            shift_id: new.shift_id,
            category: new.category,
            description: new.description,
            created: Utc::now(),
        };
        inner.incidents.insert(id, incident.clone());
        Ok(incident)
    }

    pub async fn get_incident(&self, id: IncidentId) -> CareResult<Option<IncidentView>> {
        self.read(|inner| {
            let incident = inner.incidents.get(&id)?;
            let shift = inner.shifts.get(&incident.shift_id)?;
            Some(IncidentView {
                incident: incident.clone(),
                shift_nurse_id: shift.nurse_id,
                shift_reservation_id: shift.reservation_id,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::CareStore;
    use super::*;

    #[tokio::test]
    async fn account_creation_is_atomic_on_duplicate_email() {
        let store = MemoryStore::default();

        store
            .create_account(
                "ana@example.com".to_string(),
                "Ana".to_string(),
                "Lopez".to_string(),
                String::new(),
            )
            .await
            .unwrap();

        let err = store
            .create_account(
                "ana@example.com".to_string(),
                "Ana".to_string(),
                "Lopez".to_string(),
                String::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_integrity());

        // The failed attempt must not have left a second reservation.
        let inner = store.inner.read().unwrap();
        assert_eq!(inner.reservations.len(), 1);
        assert_eq!(inner.clients.len(), 1);
    }

    #[tokio::test]
    async fn claim_rejects_assigned_shift() {
        let store = CareStore::memory();
        let reservation = store.create_reservation(0, false).await.unwrap();

        let shift = store
            .create_shift(NewShift {
                reservation_id: reservation.id,
                nurse_id: None,
                month: "2024-06".to_string(),
                status: "posted".to_string(),
            })
            .await
            .unwrap();

        let claimed = store.claim_shift(shift.id, 9).await.unwrap();
        assert_eq!(claimed.nurse_id, Some(9));

        let err = store.claim_shift(shift.id, 10).await.unwrap_err();
        assert!(err.is_integrity());
    }

    #[tokio::test]
    async fn care_log_views_join_shift_scope_columns() {
        let store = CareStore::memory();
        let reservation = store.create_reservation(0, false).await.unwrap();
        let shift = store
            .create_shift(NewShift {
                reservation_id: reservation.id,
                nurse_id: Some(4),
                month: "2024-06".to_string(),
                status: "scheduled".to_string(),
            })
            .await
            .unwrap();

        store
            .create_care_log_entry(NewCareLogEntry {
                shift_id: shift.id,
                status: "completed".to_string(),
                has_observations: true,
                created_by_nurse: true,
            })
            .await
            .unwrap();

        let views = store.list_care_logs(ShiftScope::Nurse(4)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].shift_month, "2024-06");
        assert_eq!(views[0].shift_reservation_id, reservation.id);

        assert!(store
            .list_care_logs(ShiftScope::Nurse(5))
            .await
            .unwrap()
            .is_empty());
    }
}
