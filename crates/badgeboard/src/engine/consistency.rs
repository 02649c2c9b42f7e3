//! Rules keeping employees and their credentials mutually consistent.
//!
//! An employee holds at most one BOC and at most one of badge or VRF. A
//! non-empty badge clears the VRF reference. Selecting a credential pulls
//! its current expiry into the employee's cached fields; a number that no
//! record carries leaves those fields stale.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::status::{is_candidate, refresh_credentials};
use crate::error::{Error, Result};
use crate::model::{Boc, Credential, CredentialKind, DocumentStatus, Employee, Snapshot, Vrf};

/// Which credentials an employee currently carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialState {
    /// Nothing at all.
    NoCredential,
    /// A BOC but neither badge nor VRF.
    HasBocOnly,
    /// A physical badge (with or without a BOC).
    HasBadge,
    /// A VRF (with or without a BOC).
    HasVrf,
}

impl CredentialState {
    /// Classify an employee.
    #[must_use]
    pub fn of(employee: &Employee) -> Self {
        if employee.has_badge() {
            Self::HasBadge
        } else if !employee.vrf_number.is_empty() {
            Self::HasVrf
        } else if !employee.boc_number.is_empty() {
            Self::HasBocOnly
        } else {
            Self::NoCredential
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredential => write!(f, "no credential"),
            Self::HasBocOnly => write!(f, "BOC only"),
            Self::HasBadge => write!(f, "badge"),
            Self::HasVrf => write!(f, "VRF"),
        }
    }
}

/// What a sync did to the employee's cached fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cached fields were updated from the record.
    Updated,
    /// Cached fields already matched.
    Unchanged,
    /// No number is referenced.
    Empty,
    /// The number matches no record; cached fields were left as they were.
    Dangling,
    /// VRF sync skipped because a badge is held.
    Suppressed,
}

/// Set or clear the physical badge.
///
/// A non-empty badge clears the VRF number, expiry and day count together.
pub fn set_badge(employee: &mut Employee, badge: &str) {
    employee.badge = badge.to_string();
    if !badge.is_empty() && !employee.vrf_number.is_empty() {
        debug!(
            "Badge {} set on employee {}; releasing VRF {}",
            badge, employee.id, employee.vrf_number
        );
    }
    if !badge.is_empty() {
        employee.slot_mut(CredentialKind::Vrf).clear();
    }
}

/// Pull the referenced record's current expiry into the employee.
///
/// Idempotent: a second call with unchanged records reports `Unchanged`.
pub fn sync_credential<T: Credential>(employee: &mut Employee, records: &[T]) -> SyncOutcome {
    if T::KIND == CredentialKind::Vrf && employee.has_badge() {
        return SyncOutcome::Suppressed;
    }

    let number = employee.credential_number(T::KIND).to_string();
    if number.is_empty() {
        return SyncOutcome::Empty;
    }

    let Some(record) = records.iter().find(|r| r.number() == number) else {
        warn!(
            "Employee {} references unknown {} {}; keeping cached expiry",
            employee.id,
            T::KIND,
            number
        );
        return SyncOutcome::Dangling;
    };

    let slot = employee.slot_mut(T::KIND);
    if slot.expiry.as_str() == record.expiry() && *slot.expiry_days == record.expiry_days() {
        return SyncOutcome::Unchanged;
    }
    *slot.expiry = record.expiry().to_string();
    *slot.expiry_days = record.expiry_days();
    SyncOutcome::Updated
}

/// Select a credential number for an employee.
///
/// An empty number releases the current credential. Re-selecting the
/// current number is always allowed; any other existing record must be a
/// candidate (not expired, not held by someone else). Unknown numbers are
/// accepted and leave the cached fields stale.
///
/// `records` must carry freshly derived statuses.
///
/// # Errors
///
/// Returns [`Error::BadgeExcludesVrf`] when selecting a VRF while a badge is
/// held, and [`Error::CredentialUnavailable`] when the record is expired or
/// held by another employee.
pub fn select_credential<T: Credential>(
    employee: &mut Employee,
    number: &str,
    records: &[T],
) -> Result<SyncOutcome> {
    let number = number.trim();
    if number.is_empty() {
        employee.slot_mut(T::KIND).clear();
        return Ok(SyncOutcome::Empty);
    }

    if T::KIND == CredentialKind::Vrf && employee.has_badge() {
        return Err(Error::BadgeExcludesVrf {
            employee_id: employee.id.clone(),
            badge: employee.badge.clone(),
        });
    }

    let current = employee.credential_number(T::KIND).to_string();
    if number != current {
        if let Some(record) = records.iter().find(|r| r.number() == number) {
            let held_by_self = record.assigned_employee_id() == Some(employee.id.as_str());
            if !held_by_self && !is_candidate(record, Some(current.as_str())) {
                let reason = match record.status() {
                    DocumentStatus::Expired => "expired".to_string(),
                    _ => format!(
                        "assigned to employee {}",
                        record.assigned_employee_id().unwrap_or("unknown")
                    ),
                };
                return Err(Error::credential_unavailable(T::KIND, number, reason));
            }
        }
        *employee.slot_mut(T::KIND).number = number.to_string();
    }

    Ok(sync_credential(employee, records))
}

/// Re-sync both credential snapshots of an employee.
pub fn resync_employee(employee: &mut Employee, bocs: &[Boc], vrfs: &[Vrf]) {
    sync_credential(employee, bocs);
    sync_credential(employee, vrfs);
}

/// Re-derive every status and day count, then re-sync every employee.
///
/// Credentials are refreshed first because employee snapshots copy their
/// day counts.
pub fn refresh(snapshot: &mut Snapshot, now: DateTime<Utc>) {
    refresh_credentials(&mut snapshot.bocs, &snapshot.employees, now);
    refresh_credentials(&mut snapshot.vrfs, &snapshot.employees, now);

    let Snapshot {
        employees,
        bocs,
        vrfs,
    } = snapshot;
    for employee in employees.iter_mut() {
        resync_employee(employee, bocs, vrfs);
    }
}

/// Return a refreshed copy, leaving the input untouched.
#[must_use]
pub fn refreshed(snapshot: &Snapshot, now: DateTime<Utc>) -> Snapshot {
    let mut view = snapshot.clone();
    refresh(&mut view, now);
    view
}
