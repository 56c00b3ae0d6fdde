//! Shared id and request-verb types

use serde::{Deserialize, Serialize};

/// Row ids are plain integers, matching the relational store's
/// autoincrement keys. Aliases document intent at call sites.
pub type NurseId = i64;
pub type ClientId = i64;
pub type StaffId = i64;
pub type OrganizationUserId = i64;
pub type DonorUserId = i64;
pub type ReservationId = i64;
pub type ShiftId = i64;
pub type CareLogEntryId = i64;
pub type IncidentId = i64;

/// Coarse split of HTTP verbs used by authentication backends that only
/// activate for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Read,
    Mutate,
}

impl Verb {
    /// Classify an HTTP method name.
    pub fn from_method(method: &str) -> Self {
        match method {
            "GET" | "HEAD" | "OPTIONS" => Verb::Read,
            _ => Verb::Mutate,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Verb::Mutate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_classification() {
        assert_eq!(Verb::from_method("GET"), Verb::Read);
        assert_eq!(Verb::from_method("HEAD"), Verb::Read);
        assert_eq!(Verb::from_method("POST"), Verb::Mutate);
        assert_eq!(Verb::from_method("PATCH"), Verb::Mutate);
        assert_eq!(Verb::from_method("DELETE"), Verb::Mutate);
    }
}
