//! Record types for badgeboard.
//!
//! Employees, badge/clearance credentials (BOC) and visitor/vehicle records
//! (VRF) are stored as camelCase JSON documents, so every type here keeps
//! the persisted field names and string-typed dates intact for round trips.

mod credential;
mod employee;
mod snapshot;

pub use credential::{Boc, Credential, CredentialDraft, CredentialKind, DocumentStatus, Vrf};
pub use employee::{CredentialSlot, DocumentRef, Employee, EmployeeDocuments, EmployeePatch};
pub use snapshot::{ActiveTab, Snapshot};

pub(crate) use snapshot::find_by_number;

/// Generate a fresh record identifier.
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
