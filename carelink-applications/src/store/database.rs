//! SQLite store backend

use carelink_core::{
    CareError, CareResult, ClientId, IncidentId, NurseId, ReservationId, ShiftId,
};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::error;

use crate::domain::{
    Address, CareLogEntry, CareLogView, ClientUser, DonorUser, IncidentView, NurseUser,
    OrganizationUser, Reservation, Shift, ShiftIncident, StaffUser,
};

use super::{
    NewAddress, NewCareLogEntry, NewClient, NewDonorUser, NewIncident, NewNurse,
    NewOrganizationUser, NewShift, NewStaff, NurseProfileUpdate, ShiftCheckUpdate, ShiftScope,
};

/// Database-backed domain store.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    pool: SqlitePool,
}

impl DatabaseStore {
    pub async fn new(pool: SqlitePool) -> CareResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> CareResult<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS nurses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                phone TEXT,
                first_name TEXT NOT NULL,
                surname TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                set_password_code TEXT,
                bank_name TEXT,
                emergency_contact TEXT,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reservations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                status INTEGER NOT NULL DEFAULT 0,
                by_admin INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                first_name TEXT NOT NULL,
                surname TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                set_password_code TEXT,
                reservation_id INTEGER NOT NULL REFERENCES reservations(id),
                account_holder INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS staff_users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 1,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS organization_users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                organization_id INTEGER NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS donor_users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                donor_id INTEGER NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS addresses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id INTEGER NOT NULL REFERENCES reservations(id),
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                postal_code TEXT NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shifts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id INTEGER NOT NULL REFERENCES reservations(id),
                nurse_id INTEGER REFERENCES nurses(id),
                month TEXT NOT NULL,
                status TEXT NOT NULL,
                checkin TEXT,
                checkout TEXT,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS care_log_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shift_id INTEGER NOT NULL REFERENCES shifts(id),
                status TEXT NOT NULL,
                has_observations INTEGER NOT NULL DEFAULT 0,
                created_by_nurse INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS shift_incidents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shift_id INTEGER NOT NULL REFERENCES shifts(id),
                category INTEGER NOT NULL,
                description TEXT NOT NULL,
                created TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shifts_nurse ON shifts(nurse_id);
            CREATE INDEX IF NOT EXISTS idx_shifts_reservation ON shifts(reservation_id);
            CREATE INDEX IF NOT EXISTS idx_care_log_shift ON care_log_entries(shift_id);
        "#;

        sqlx::query(query).execute(&self.pool).await.map_err(|e| {
            error!("failed to create domain tables: {}", e);
            CareError::storage_with("failed to create domain tables", e)
        })?;

        Ok(())
    }

    // --- nurses ---

    pub async fn create_nurse(&self, new: NewNurse) -> CareResult<NurseUser> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO nurses (email, phone, first_name, surname, password_hash, created)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.first_name)
        .bind(&new.surname)
        .bind(&new.password_hash)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(NurseUser {
            id: result.last_insert_rowid(),
            email: new.email,
            phone: new.phone,
            first_name: new.first_name,
            surname: new.surname,
            password_hash: new.password_hash,
            set_password_code: None,
            bank_name: None,
            emergency_contact: None,
            created,
        })
    }

    pub async fn get_nurse(&self, id: NurseId) -> CareResult<Option<NurseUser>> {
        let row = sqlx::query("SELECT * FROM nurses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query nurse", e))?;

        Ok(row.map(nurse_from_row))
    }

    pub async fn find_nurse_by_email(&self, email: &str) -> CareResult<Option<NurseUser>> {
        let row = sqlx::query("SELECT * FROM nurses WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query nurse", e))?;

        Ok(row.map(nurse_from_row))
    }

    pub async fn update_nurse_profile(
        &self,
        id: NurseId,
        update: NurseProfileUpdate,
    ) -> CareResult<NurseUser> {
        let mut updates = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(phone) = update.phone {
            updates.push("phone = ?");
            values.push(phone);
        }
        if let Some(first_name) = update.first_name {
            updates.push("first_name = ?");
            values.push(first_name);
        }
        if let Some(surname) = update.surname {
            updates.push("surname = ?");
            values.push(surname);
        }
        if let Some(bank_name) = update.bank_name {
            updates.push("bank_name = ?");
            values.push(bank_name);
        }
        if let Some(emergency_contact) = update.emergency_contact {
            updates.push("emergency_contact = ?");
            values.push(emergency_contact);
        }

        if !updates.is_empty() {
            let query = format!("UPDATE nurses SET {} WHERE id = ?", updates.join(", "));
            let mut q = sqlx::query(&query);
            for value in &values {
                q = q.bind(value);
            }
            q.bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;
        }

        self.get_nurse(id)
            .await?
            .ok_or_else(|| CareError::not_found("nurse"))
    }

    pub async fn set_nurse_password_code(&self, id: NurseId, code: String) -> CareResult<()> {
        let result = sqlx::query("UPDATE nurses SET set_password_code = ? WHERE id = ?")
            .bind(&code)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(CareError::not_found("nurse"));
        }
        Ok(())
    }

    // --- clients and reservations ---

    pub async fn create_reservation(
        &self,
        status: i64,
        by_admin: bool,
    ) -> CareResult<Reservation> {
        let created = Utc::now();
        let result = sqlx::query(
            "INSERT INTO reservations (status, by_admin, created) VALUES (?, ?, ?)",
        )
        .bind(status)
        .bind(by_admin)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(Reservation {
            id: result.last_insert_rowid(),
            status,
            by_admin,
            created,
        })
    }

    pub async fn create_client(&self, new: NewClient) -> CareResult<ClientUser> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO clients
                (email, first_name, surname, password_hash, reservation_id, account_holder, created)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.surname)
        .bind(&new.password_hash)
        .bind(new.reservation_id)
        .bind(new.account_holder)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(ClientUser {
            id: result.last_insert_rowid(),
            email: new.email,
            first_name: new.first_name,
            surname: new.surname,
            password_hash: new.password_hash,
            set_password_code: None,
            reservation_id: new.reservation_id,
            account_holder: new.account_holder,
            created,
        })
    }

    pub async fn create_account(
        &self,
        email: String,
        first_name: String,
        surname: String,
        password_hash: String,
    ) -> CareResult<(Reservation, ClientUser)> {
        let created = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CareError::storage_with("failed to open transaction", e))?;

        let reservation_id = sqlx::query(
            "INSERT INTO reservations (status, by_admin, created) VALUES (0, 0, ?)",
        )
        .bind(created.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?
        .last_insert_rowid();

        let client_id = sqlx::query(
            r#"
            INSERT INTO clients
                (email, first_name, surname, password_hash, reservation_id, account_holder, created)
            VALUES (?, ?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(&email)
        .bind(&first_name)
        .bind(&surname)
        .bind(&password_hash)
        .bind(reservation_id)
        .bind(created.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?
        .last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| CareError::storage_with("failed to commit transaction", e))?;

        Ok((
            Reservation {
                id: reservation_id,
                status: 0,
                by_admin: false,
                created,
            },
            ClientUser {
                id: client_id,
                email,
                first_name,
                surname,
                password_hash,
                set_password_code: None,
                reservation_id,
                account_holder: true,
                created,
            },
        ))
    }

    pub async fn get_client(&self, id: ClientId) -> CareResult<Option<ClientUser>> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query client", e))?;

        Ok(row.map(client_from_row))
    }

    pub async fn find_client_by_email(&self, email: &str) -> CareResult<Option<ClientUser>> {
        let row = sqlx::query("SELECT * FROM clients WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query client", e))?;

        Ok(row.map(client_from_row))
    }

    pub async fn create_address(&self, new: NewAddress) -> CareResult<Address> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO addresses (reservation_id, street, city, postal_code, created)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.reservation_id)
        .bind(&new.street)
        .bind(&new.city)
        .bind(&new.postal_code)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(Address {
            id: result.last_insert_rowid(),
            reservation_id: new.reservation_id,
            street: new.street,
            city: new.city,
            postal_code: new.postal_code,
            created,
        })
    }

    // --- staff ---

    pub async fn create_staff(&self, new: NewStaff) -> CareResult<StaffUser> {
        let created = Utc::now();
        let result = sqlx::query(
            "INSERT INTO staff_users (email, password_hash, is_staff, created) VALUES (?, ?, 1, ?)",
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(StaffUser {
            id: result.last_insert_rowid(),
            email: new.email,
            password_hash: new.password_hash,
            is_staff: true,
            created,
        })
    }

    pub async fn get_staff(&self, id: i64) -> CareResult<Option<StaffUser>> {
        let row = sqlx::query("SELECT * FROM staff_users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query staff user", e))?;

        Ok(row.map(|row| StaffUser {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_staff: row.get::<i64, _>("is_staff") != 0,
            created: parse_timestamp(row.get("created")),
        }))
    }

    // --- organization and donor users ---

    pub async fn create_organization_user(
        &self,
        new: NewOrganizationUser,
    ) -> CareResult<OrganizationUser> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO organization_users (email, password_hash, organization_id, created)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.organization_id)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(OrganizationUser {
            id: result.last_insert_rowid(),
            email: new.email,
            password_hash: new.password_hash,
            organization_id: new.organization_id,
            created,
        })
    }

    pub async fn get_organization_user(&self, id: i64) -> CareResult<Option<OrganizationUser>> {
        let row = sqlx::query("SELECT * FROM organization_users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query organization user", e))?;

        Ok(row.map(organization_user_from_row))
    }

    pub async fn find_organization_user_by_email(
        &self,
        email: &str,
    ) -> CareResult<Option<OrganizationUser>> {
        let row = sqlx::query("SELECT * FROM organization_users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query organization user", e))?;

        Ok(row.map(organization_user_from_row))
    }

    pub async fn list_organization_users(&self) -> CareResult<Vec<OrganizationUser>> {
        let rows = sqlx::query("SELECT * FROM organization_users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to list organization users", e))?;

        Ok(rows.into_iter().map(organization_user_from_row).collect())
    }

    pub async fn create_donor_user(&self, new: NewDonorUser) -> CareResult<DonorUser> {
        let created = Utc::now();
        let result = sqlx::query(
            "INSERT INTO donor_users (email, password_hash, donor_id, created) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.donor_id)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(DonorUser {
            id: result.last_insert_rowid(),
            email: new.email,
            password_hash: new.password_hash,
            donor_id: new.donor_id,
            created,
        })
    }

    pub async fn get_donor_user(&self, id: i64) -> CareResult<Option<DonorUser>> {
        let row = sqlx::query("SELECT * FROM donor_users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query donor user", e))?;

        Ok(row.map(donor_user_from_row))
    }

    pub async fn find_donor_user_by_email(&self, email: &str) -> CareResult<Option<DonorUser>> {
        let row = sqlx::query("SELECT * FROM donor_users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query donor user", e))?;

        Ok(row.map(donor_user_from_row))
    }

    // --- shifts ---

    pub async fn create_shift(&self, new: NewShift) -> CareResult<Shift> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO shifts (reservation_id, nurse_id, month, status, created)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.reservation_id)
        .bind(new.nurse_id)
        .bind(&new.month)
        .bind(&new.status)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(Shift {
            id: result.last_insert_rowid(),
            reservation_id: new.reservation_id,
            nurse_id: new.nurse_id,
            month: new.month,
            status: new.status,
            checkin: None,
            checkout: None,
            created,
        })
    }

    pub async fn get_shift(&self, id: ShiftId) -> CareResult<Option<Shift>> {
        let row = sqlx::query("SELECT * FROM shifts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CareError::storage_with("failed to query shift", e))?;

        Ok(row.map(shift_from_row))
    }

    pub async fn list_shifts(&self, scope: ShiftScope) -> CareResult<Vec<Shift>> {
        let rows = match scope {
            ShiftScope::All => {
                sqlx::query("SELECT * FROM shifts ORDER BY id")
                    .fetch_all(&self.pool)
                    .await
            }
            ShiftScope::Nurse(nurse_id) => {
                sqlx::query("SELECT * FROM shifts WHERE nurse_id = ? ORDER BY id")
                    .bind(nurse_id)
                    .fetch_all(&self.pool)
                    .await
            }
            ShiftScope::Reservation(reservation_id) => {
                sqlx::query("SELECT * FROM shifts WHERE reservation_id = ? ORDER BY id")
                    .bind(reservation_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| CareError::storage_with("failed to list shifts", e))?;

        Ok(rows.into_iter().map(shift_from_row).collect())
    }

    pub async fn record_shift_check(
        &self,
        id: ShiftId,
        update: ShiftCheckUpdate,
    ) -> CareResult<Shift> {
        let mut updates = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(checkin) = update.checkin {
            updates.push("checkin = ?");
            values.push(checkin.to_rfc3339());
        }
        if let Some(checkout) = update.checkout {
            updates.push("checkout = ?");
            values.push(checkout.to_rfc3339());
        }
        if let Some(status) = update.status {
            updates.push("status = ?");
            values.push(status);
        }

        if !updates.is_empty() {
            let query = format!("UPDATE shifts SET {} WHERE id = ?", updates.join(", "));
            let mut q = sqlx::query(&query);
            for value in &values {
                q = q.bind(value);
            }
            q.bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_write_error)?;
        }

        self.get_shift(id)
            .await?
            .ok_or_else(|| CareError::not_found("shift"))
    }

    pub async fn claim_shift(&self, id: ShiftId, nurse_id: NurseId) -> CareResult<Shift> {
        let result = sqlx::query(
            "UPDATE shifts SET nurse_id = ? WHERE id = ? AND nurse_id IS NULL",
        )
        .bind(nurse_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return match self.get_shift(id).await? {
                Some(_) => Err(CareError::integrity("shift already assigned")),
                None => Err(CareError::not_found("shift")),
            };
        }

        self.get_shift(id)
            .await?
            .ok_or_else(|| CareError::not_found("shift"))
    }

    // --- care logs ---

    pub async fn create_care_log_entry(&self, new: NewCareLogEntry) -> CareResult<CareLogEntry> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO care_log_entries (shift_id, status, has_observations, created_by_nurse, created)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.shift_id)
        .bind(&new.status)
        .bind(new.has_observations)
        .bind(new.created_by_nurse)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(CareLogEntry {
            id: result.last_insert_rowid(),
            shift_id: new.shift_id,
            status: new.status,
            has_observations: new.has_observations,
            created_by_nurse: new.created_by_nurse,
            created,
        })
    }

    pub async fn list_care_logs(&self, scope: ShiftScope) -> CareResult<Vec<CareLogView>> {
        let base = r#"
            SELECT e.id, e.shift_id, e.status, e.has_observations, e.created_by_nurse, e.created,
                   s.month AS shift_month, s.nurse_id AS shift_nurse_id,
                   s.reservation_id AS shift_reservation_id
            FROM care_log_entries e
            JOIN shifts s ON s.id = e.shift_id
        "#;

        let rows = match scope {
            ShiftScope::All => {
                sqlx::query(&format!("{} ORDER BY e.id", base))
                    .fetch_all(&self.pool)
                    .await
            }
            ShiftScope::Nurse(nurse_id) => {
                sqlx::query(&format!("{} WHERE s.nurse_id = ? ORDER BY e.id", base))
                    .bind(nurse_id)
                    .fetch_all(&self.pool)
                    .await
            }
            ShiftScope::Reservation(reservation_id) => {
                sqlx::query(&format!("{} WHERE s.reservation_id = ? ORDER BY e.id", base))
                    .bind(reservation_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| CareError::storage_with("failed to list care log entries", e))?;

        Ok(rows
            .into_iter()
            .map(|row| CareLogView {
                entry: CareLogEntry {
                    id: row.get("id"),
                    shift_id: row.get("shift_id"),
                    status: row.get("status"),
                    has_observations: row.get::<i64, _>("has_observations") != 0,
                    created_by_nurse: row.get::<i64, _>("created_by_nurse") != 0,
                    created: parse_timestamp(row.get("created")),
                },
                shift_month: row.get("shift_month"),
                shift_nurse_id: row.get("shift_nurse_id"),
                shift_reservation_id: row.get("shift_reservation_id"),
            })
            .collect())
    }

    // --- incidents ---

    pub async fn create_incident(&self, new: NewIncident) -> CareResult<ShiftIncident> {
        let created = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO shift_incidents (shift_id, category, description, created)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.shift_id)
        .bind(new.category)
        .bind(&new.description)
        .bind(created.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(ShiftIncident {
            id: result.last_insert_rowid(),
            shift_id: new.shift_id,
            category: new.category,
            description: new.description,
            created,
        })
    }

    pub async fn get_incident(&self, id: IncidentId) -> CareResult<Option<IncidentView>> {
        let row = sqlx::query(
            r#"
            SELECT i.id, i.shift_id, i.category, i.description, i.created,
                   s.nurse_id AS shift_nurse_id, s.reservation_id AS shift_reservation_id
            FROM shift_incidents i
            JOIN shifts s ON s.id = i.shift_id
            WHERE i.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CareError::storage_with("failed to query incident", e))?;

        Ok(row.map(|row| IncidentView {
            incident: ShiftIncident {
                id: row.get("id"),
                shift_id: row.get("shift_id"),
                category: row.get("category"),
                description: row.get("description"),
                created: parse_timestamp(row.get("created")),
            },
            shift_nurse_id: row.get("shift_nurse_id"),
            shift_reservation_id: row.get("shift_reservation_id"),
        }))
    }
}

fn nurse_from_row(row: sqlx::sqlite::SqliteRow) -> NurseUser {
    NurseUser {
        id: row.get("id"),
        email: row.get("email"),
        phone: row.get("phone"),
        first_name: row.get("first_name"),
        surname: row.get("surname"),
        password_hash: row.get("password_hash"),
        set_password_code: row.get("set_password_code"),
        bank_name: row.get("bank_name"),
        emergency_contact: row.get("emergency_contact"),
        created: parse_timestamp(row.get("created")),
    }
}

fn client_from_row(row: sqlx::sqlite::SqliteRow) -> ClientUser {
    ClientUser {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        surname: row.get("surname"),
        password_hash: row.get("password_hash"),
        set_password_code: row.get("set_password_code"),
        reservation_id: row.get("reservation_id"),
        account_holder: row.get::<i64, _>("account_holder") != 0,
        created: parse_timestamp(row.get("created")),
    }
}

fn organization_user_from_row(row: sqlx::sqlite::SqliteRow) -> OrganizationUser {
    OrganizationUser {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        organization_id: row.get("organization_id"),
        created: parse_timestamp(row.get("created")),
    }
}

fn donor_user_from_row(row: sqlx::sqlite::SqliteRow) -> DonorUser {
    DonorUser {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        donor_id: row.get("donor_id"),
        created: parse_timestamp(row.get("created")),
    }
}

fn shift_from_row(row: sqlx::sqlite::SqliteRow) -> Shift {
    Shift {
        id: row.get("id"),
        reservation_id: row.get("reservation_id"),
        nurse_id: row.get("nurse_id"),
        month: row.get("month"),
        status: row.get("status"),
        checkin: row
            .get::<Option<String>, _>("checkin")
            .map(parse_timestamp),
        checkout: row
            .get::<Option<String>, _>("checkout")
            .map(parse_timestamp),
        created: parse_timestamp(row.get("created")),
    }
}

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn map_write_error(error: sqlx::Error) -> CareError {
    if let sqlx::Error::Database(db) = &error {
        if db.message().contains("UNIQUE constraint failed") {
            return CareError::integrity(db.message().to_string());
        }
    }
    CareError::storage_with("write failed", error)
}
