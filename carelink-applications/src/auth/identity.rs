//! Authenticated identity
//!
//! The role tag is derived from which backend produced the identity,
//! never from anything the client asserts. Dispatching on a closed enum
//! keeps the per-role branches exhaustive at compile time.

use serde::{Deserialize, Serialize};

use crate::domain::{ClientUser, DonorUser, NurseUser, OrganizationUser, StaffUser};

use super::backends::BackendKind;

/// Which population an authenticated request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleTag {
    Nurse,
    Client,
    Organization,
    Donor,
    Staff,
    Internal,
}

impl std::fmt::Display for RoleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleTag::Nurse => write!(f, "nurse"),
            RoleTag::Client => write!(f, "client"),
            RoleTag::Organization => write!(f, "organization"),
            RoleTag::Donor => write!(f, "donor"),
            RoleTag::Staff => write!(f, "staff"),
            RoleTag::Internal => write!(f, "internal"),
        }
    }
}

impl std::str::FromStr for RoleTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nurse" => Ok(RoleTag::Nurse),
            "client" => Ok(RoleTag::Client),
            "organization" => Ok(RoleTag::Organization),
            "donor" => Ok(RoleTag::Donor),
            "staff" => Ok(RoleTag::Staff),
            "internal" => Ok(RoleTag::Internal),
            _ => Err(format!("Unknown role tag: {}", s)),
        }
    }
}

/// The concrete identity a backend resolved.
#[derive(Debug, Clone)]
pub enum Principal {
    Nurse(NurseUser),
    Client(ClientUser),
    Organization(OrganizationUser),
    Donor(DonorUser),
    Staff(StaffUser),
    /// A trusted in-house process presenting the shared service secret.
    /// Carries no user row and, notably, no staff flag.
    Internal,
}

impl Principal {
    pub fn role_tag(&self) -> RoleTag {
        match self {
            Principal::Nurse(_) => RoleTag::Nurse,
            Principal::Client(_) => RoleTag::Client,
            Principal::Organization(_) => RoleTag::Organization,
            Principal::Donor(_) => RoleTag::Donor,
            Principal::Staff(_) => RoleTag::Staff,
            Principal::Internal => RoleTag::Internal,
        }
    }
}

/// Identity plus provenance for one authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    principal: Principal,
    backend: BackendKind,
}

impl AuthContext {
    pub fn new(principal: Principal, backend: BackendKind) -> Self {
        Self { principal, backend }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The backend that authenticated this request.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn role(&self) -> RoleTag {
        self.principal.role_tag()
    }

    /// Staff override used as the final fallback of every permission
    /// predicate. The internal principal is trusted plumbing, not staff.
    pub fn is_staff(&self) -> bool {
        match &self.principal {
            Principal::Staff(staff) => staff.is_staff,
            _ => false,
        }
    }

    pub fn nurse(&self) -> Option<&NurseUser> {
        match &self.principal {
            Principal::Nurse(nurse) => Some(nurse),
            _ => None,
        }
    }

    pub fn client(&self) -> Option<&ClientUser> {
        match &self.principal {
            Principal::Client(client) => Some(client),
            _ => None,
        }
    }

    pub fn organization_user(&self) -> Option<&OrganizationUser> {
        match &self.principal {
            Principal::Organization(user) => Some(user),
            _ => None,
        }
    }

    pub fn donor_user(&self) -> Option<&DonorUser> {
        match &self.principal {
            Principal::Donor(user) => Some(user),
            _ => None,
        }
    }

    /// The id of the underlying user row, if there is one.
    pub fn user_id(&self) -> Option<i64> {
        match &self.principal {
            Principal::Nurse(u) => Some(u.id),
            Principal::Client(u) => Some(u.id),
            Principal::Organization(u) => Some(u.id),
            Principal::Donor(u) => Some(u.id),
            Principal::Staff(u) => Some(u.id),
            Principal::Internal => None,
        }
    }

    /// Summary string for log lines.
    pub fn summary(&self) -> String {
        match self.user_id() {
            Some(id) => format!("{}({})", self.role(), id),
            None => self.role().to_string(),
        }
    }
}
