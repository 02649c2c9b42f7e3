//! Document status derivation and assignment candidates.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::expiry::days_until;
use crate::model::{Credential, DocumentStatus, Employee};

/// Derive a credential's status from its day count and assignment.
///
/// Expiry overrides assignment.
#[must_use]
pub fn derive_status(expiry_days: i64, assigned: bool) -> DocumentStatus {
    if expiry_days <= 0 {
        DocumentStatus::Expired
    } else if assigned {
        DocumentStatus::Assigned
    } else {
        DocumentStatus::Available
    }
}

/// Whether `record` may be offered to an employee whose current number is `current`.
#[must_use]
pub fn is_candidate<T: Credential>(record: &T, current: Option<&str>) -> bool {
    let is_current = current.is_some_and(|n| !n.is_empty() && n == record.number());
    record.status() != DocumentStatus::Expired
        && (record.status() == DocumentStatus::Available || is_current)
}

/// Records that may be selected by an employee whose current number is `current`.
///
/// Pass `None` when creating a new employee.
pub fn candidates<'a, T: Credential>(records: &'a [T], current: Option<&str>) -> Vec<&'a T> {
    records
        .iter()
        .filter(|r| is_candidate(*r, current))
        .collect()
}

/// Find who holds `record`.
///
/// An employee referencing the number wins. Otherwise the stored
/// back-reference counts while that employee exists and does not reference
/// another record of the same kind.
fn holder_of<T: Credential>(record: &T, employees: &[Employee]) -> Option<String> {
    let number = record.number();
    let mut holders = employees
        .iter()
        .filter(|e| !number.is_empty() && e.credential_number(T::KIND) == number);

    if let Some(first) = holders.next() {
        if let Some(other) = holders.next() {
            warn!(
                "{} {} is referenced by several employees ({}, {}); keeping the first",
                T::KIND,
                number,
                first.id,
                other.id
            );
        }
        return Some(first.id.clone());
    }

    let back_ref = record.assigned_employee_id()?;
    employees
        .iter()
        .find(|e| e.id == back_ref)
        .filter(|e| e.credential_number(T::KIND).is_empty())
        .map(|e| e.id.clone())
}

/// Recompute day counts, holders and statuses for a credential collection.
pub fn refresh_credentials<T: Credential>(
    records: &mut [T],
    employees: &[Employee],
    now: DateTime<Utc>,
) {
    for record in records.iter_mut() {
        let days = days_until(record.expiry(), now);
        let holder = holder_of(record, employees);
        let status = derive_status(days, holder.is_some());
        record.set_derived(days, status, holder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Boc;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
    }

    fn boc(number: &str, expiry: &str, status: DocumentStatus) -> Boc {
        Boc {
            id: format!("id-{number}"),
            boc_number: number.to_string(),
            boc_expiry: expiry.to_string(),
            status,
            ..Boc::default()
        }
    }

    fn employee(id: &str, boc_number: &str) -> Employee {
        let mut e = Employee::new(id.to_string(), 1);
        e.boc_number = boc_number.to_string();
        e
    }

    #[test]
    fn test_derive_status_expired_overrides_assignment() {
        assert_eq!(derive_status(0, true), DocumentStatus::Expired);
        assert_eq!(derive_status(-4, false), DocumentStatus::Expired);
        assert_eq!(derive_status(1, true), DocumentStatus::Assigned);
        assert_eq!(derive_status(1, false), DocumentStatus::Available);
    }

    #[test]
    fn test_candidates_for_new_employee() {
        let records = vec![
            boc("B-1", "", DocumentStatus::Available),
            boc("B-2", "", DocumentStatus::Assigned),
            boc("B-3", "", DocumentStatus::Expired),
        ];
        let numbers: Vec<_> = candidates(&records, None)
            .iter()
            .map(|r| r.boc_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["B-1"]);
    }

    #[test]
    fn test_current_assignment_stays_selectable_for_holder_only() {
        let records = vec![
            boc("B-1", "", DocumentStatus::Available),
            boc("B-2", "", DocumentStatus::Assigned),
        ];

        let holder: Vec<_> = candidates(&records, Some("B-2"))
            .iter()
            .map(|r| r.boc_number.as_str())
            .collect();
        assert_eq!(holder, vec!["B-1", "B-2"]);

        let other: Vec<_> = candidates(&records, Some("B-9"))
            .iter()
            .map(|r| r.boc_number.as_str())
            .collect();
        assert_eq!(other, vec!["B-1"]);
    }

    #[test]
    fn test_expired_current_is_not_a_candidate() {
        let records = vec![boc("B-1", "", DocumentStatus::Expired)];
        assert!(candidates(&records, Some("B-1")).is_empty());
    }

    #[test]
    fn test_refresh_marks_assigned_and_expired() {
        let mut records = vec![
            boc("B-1", "2024-02-01", DocumentStatus::Available),
            boc("B-2", "2024-02-01", DocumentStatus::Available),
            boc("B-3", "2024-01-01", DocumentStatus::Available),
        ];
        let employees = vec![employee("e1", "B-1"), employee("e2", "B-3")];

        refresh_credentials(&mut records, &employees, now());

        assert_eq!(records[0].status, DocumentStatus::Assigned);
        assert_eq!(records[0].assigned_employee_id.as_deref(), Some("e1"));
        assert_eq!(records[0].boc_expiry_days, 27);
        assert_eq!(records[1].status, DocumentStatus::Available);
        assert_eq!(records[2].status, DocumentStatus::Expired);
        assert_eq!(records[2].assigned_employee_id.as_deref(), Some("e2"));
    }

    #[test]
    fn test_refresh_keeps_back_reference_of_existing_employee() {
        let mut record = boc("B-1", "2024-02-01", DocumentStatus::Available);
        record.assigned_employee_id = Some("e1".to_string());
        let mut records = vec![record];

        refresh_credentials(&mut records, &[employee("e1", "")], now());
        assert_eq!(records[0].status, DocumentStatus::Assigned);

        // The employee has since been deleted.
        refresh_credentials(&mut records, &[], now());
        assert_eq!(records[0].status, DocumentStatus::Available);
        assert!(records[0].assigned_employee_id.is_none());
    }

    #[test]
    fn test_refresh_drops_back_reference_when_holder_moved_on() {
        let mut record = boc("B-1", "2024-02-01", DocumentStatus::Assigned);
        record.assigned_employee_id = Some("e1".to_string());
        let mut records = vec![record, boc("B-2", "2024-02-01", DocumentStatus::Available)];

        refresh_credentials(&mut records, &[employee("e1", "B-2")], now());

        assert_eq!(records[0].status, DocumentStatus::Available);
        assert_eq!(records[1].status, DocumentStatus::Assigned);
    }
}
