//! The record registry.
//!
//! [`Registry`] owns the current [`Snapshot`] and the [`Storage`] it was
//! loaded from. Every mutation works on a refreshed copy, applies the
//! consistency rules, re-derives statuses and day counts, persists the copy
//! in one transaction and only then swaps it in. A failed mutation leaves
//! both the store and the in-memory snapshot untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::attachment::{Attachment, AttachmentMeta, DocumentCategory, NewAttachment};
use crate::engine::{candidates, refresh, refreshed, select_credential, set_badge};
use crate::error::{Error, Result};
use crate::model::{
    find_by_number, generate_id, ActiveTab, Boc, Credential, CredentialDraft, CredentialKind,
    Employee, EmployeePatch, Snapshot, Vrf,
};
use crate::storage::{AttachmentInsert, Storage};

/// Access to one credential collection of a snapshot.
trait Collection: Credential {
    fn records(snapshot: &Snapshot) -> &Vec<Self>;
    fn records_mut(snapshot: &mut Snapshot) -> &mut Vec<Self>;
}

impl Collection for Boc {
    fn records(snapshot: &Snapshot) -> &Vec<Self> {
        &snapshot.bocs
    }

    fn records_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.bocs
    }
}

impl Collection for Vrf {
    fn records(snapshot: &Snapshot) -> &Vec<Self> {
        &snapshot.vrfs
    }

    fn records_mut(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.vrfs
    }
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows turned into new records.
    pub added: usize,
    /// Rows skipped as duplicates or blanks.
    pub skipped: usize,
}

/// Owner of the record set.
#[derive(Debug)]
pub struct Registry {
    storage: Storage,
    snapshot: Snapshot,
}

impl Registry {
    /// Load the registry from a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored documents cannot be read.
    pub fn open(storage: Storage) -> Result<Self> {
        let snapshot = storage.load_snapshot()?;
        info!(
            "Loaded {} employees, {} BOCs, {} VRFs",
            snapshot.employees.len(),
            snapshot.bocs.len(),
            snapshot.vrfs.len()
        );
        Ok(Self { storage, snapshot })
    }

    /// The snapshot as last persisted.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The snapshot with statuses, day counts and employee caches
    /// re-derived for `now`.
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> Snapshot {
        refreshed(&self.snapshot, now)
    }

    fn commit(&mut self, mut next: Snapshot, now: DateTime<Utc>) -> Result<()> {
        refresh(&mut next, now);
        self.storage.save_snapshot(&next)?;
        self.snapshot = next;
        Ok(())
    }

    // === Employees ===

    /// Look up an employee as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmployeeNotFound`] for an unknown id.
    pub fn employee(&self, id: &str, now: DateTime<Utc>) -> Result<Employee> {
        self.view(now)
            .employee(id)
            .cloned()
            .ok_or_else(|| Error::EmployeeNotFound { id: id.to_string() })
    }

    /// Create an employee.
    ///
    /// `no` defaults to one past the current head count. Credential fields
    /// go through the selection rules.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a name is missing, and the selection
    /// errors of [`select_credential`].
    pub fn add_employee(&mut self, patch: EmployeePatch, now: DateTime<Utc>) -> Result<Employee> {
        let mut next = self.view(now);
        let no = patch
            .no
            .unwrap_or_else(|| i64::try_from(next.employees.len()).unwrap_or(i64::MAX) + 1);

        let mut employee = Employee::new(generate_id(), no);
        patch.apply_plain_fields(&mut employee);
        validate_names(&employee)?;
        apply_credentials(&mut employee, &patch, &mut next)?;

        let id = employee.id.clone();
        info!("Adding employee {} ({})", employee.full_name(), id);
        next.employees.push(employee);
        self.commit(next, now)?;
        self.employee(&id, now)
    }

    /// Edit an employee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmployeeNotFound`], a validation error when a name
    /// is blanked, or the selection errors of [`select_credential`].
    pub fn update_employee(
        &mut self,
        id: &str,
        patch: EmployeePatch,
        now: DateTime<Utc>,
    ) -> Result<Employee> {
        let mut next = self.view(now);
        let index = next
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::EmployeeNotFound { id: id.to_string() })?;

        let mut employee = next.employees[index].clone();
        patch.apply_plain_fields(&mut employee);
        validate_names(&employee)?;
        apply_credentials(&mut employee, &patch, &mut next)?;

        debug!("Updating employee {}", id);
        next.employees[index] = employee;
        self.commit(next, now)?;
        self.employee(id, now)
    }

    /// Delete an employee and its attachments.
    ///
    /// Credentials it held become available again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmployeeNotFound`] for an unknown id.
    pub fn delete_employee(&mut self, id: &str, now: DateTime<Utc>) -> Result<Employee> {
        let mut next = self.snapshot.clone();
        let index = next
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::EmployeeNotFound { id: id.to_string() })?;
        let removed = next.employees.remove(index);

        refresh(&mut next, now);
        self.storage.save_snapshot_deleting_attachments(&next, id)?;
        self.snapshot = next;
        info!("Deleted employee {} ({})", removed.full_name(), id);
        Ok(removed)
    }

    // === Credentials ===

    /// Create a BOC record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing number or expiry,
    /// [`Error::DuplicateNumber`] when the number exists, and the selection
    /// errors when an assignee is given.
    pub fn add_boc(&mut self, draft: CredentialDraft, now: DateTime<Utc>) -> Result<Boc> {
        self.add_credential(draft, now)
    }

    /// Edit a BOC record.
    ///
    /// # Errors
    ///
    /// As [`Registry::add_boc`], plus [`Error::CredentialNotFound`].
    pub fn update_boc(
        &mut self,
        id: &str,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> Result<Boc> {
        self.update_credential(id, draft, now)
    }

    /// Create a VRF record. An access level is required.
    ///
    /// # Errors
    ///
    /// As [`Registry::add_boc`].
    pub fn add_vrf(&mut self, draft: CredentialDraft, now: DateTime<Utc>) -> Result<Vrf> {
        self.add_credential(draft, now)
    }

    /// Edit a VRF record.
    ///
    /// # Errors
    ///
    /// As [`Registry::update_boc`].
    pub fn update_vrf(
        &mut self,
        id: &str,
        draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> Result<Vrf> {
        self.update_credential(id, draft, now)
    }

    /// BOC records that may be selected for an employee, or for a new
    /// employee when `employee_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmployeeNotFound`] for an unknown id.
    pub fn boc_candidates(
        &self,
        employee_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Boc>> {
        self.credential_candidates(employee_id, now)
    }

    /// VRF records that may be selected for an employee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmployeeNotFound`] for an unknown id.
    pub fn vrf_candidates(
        &self,
        employee_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Vrf>> {
        self.credential_candidates(employee_id, now)
    }

    fn credential_candidates<T: Collection>(
        &self,
        employee_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<T>> {
        let view = self.view(now);
        let current = match employee_id {
            Some(id) => Some(
                view.employee(id)
                    .ok_or_else(|| Error::EmployeeNotFound { id: id.to_string() })?
                    .credential_number(T::KIND)
                    .to_string(),
            ),
            None => None,
        };
        Ok(candidates(T::records(&view), current.as_deref())
            .into_iter()
            .cloned()
            .collect())
    }

    fn add_credential<T: Collection>(
        &mut self,
        mut draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> Result<T> {
        normalize_draft::<T>(&mut draft)?;
        let mut next = self.view(now);

        if find_by_number(T::records(&next), &draft.number).is_some() {
            return Err(Error::DuplicateNumber {
                kind: T::KIND,
                number: draft.number,
            });
        }

        let assignee = draft.assigned_employee_id.take();
        let number = draft.number.clone();
        let record = T::from_draft(generate_id(), draft);
        let id = record.id().to_string();
        T::records_mut(&mut next).push(record);

        if let Some(employee_id) = assignee.filter(|a| !a.is_empty()) {
            assign_from_credential::<T>(&mut next, &number, &employee_id, now)?;
        }

        info!("Adding {} {}", T::KIND, number);
        self.commit(next, now)?;
        self.stored_credential(&id)
    }

    fn update_credential<T: Collection>(
        &mut self,
        id: &str,
        mut draft: CredentialDraft,
        now: DateTime<Utc>,
    ) -> Result<T> {
        normalize_draft::<T>(&mut draft)?;
        let mut next = self.view(now);

        let index = T::records(&next)
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::credential_not_found(T::KIND, id))?;
        let old_number = T::records(&next)[index].number().to_string();
        let new_number = draft.number.clone();

        if new_number != old_number && find_by_number(T::records(&next), &new_number).is_some() {
            return Err(Error::DuplicateNumber {
                kind: T::KIND,
                number: new_number,
            });
        }

        let assignee = match draft.assigned_employee_id.take() {
            // Blank assignee releases whoever holds the record.
            Some(a) if a.is_empty() => {
                release_holders(&mut next, T::KIND, &old_number);
                None
            }
            Some(a) => Some(a),
            None => {
                draft.assigned_employee_id = T::records(&next)[index]
                    .assigned_employee_id()
                    .map(str::to_string);
                None
            }
        };

        T::records_mut(&mut next)[index].apply_draft(draft);

        if new_number != old_number {
            info!("Renaming {} {} to {}", T::KIND, old_number, new_number);
            for employee in &mut next.employees {
                if employee.credential_number(T::KIND) == old_number {
                    *employee.slot_mut(T::KIND).number = new_number.clone();
                }
            }
        }

        if let Some(employee_id) = assignee {
            assign_from_credential::<T>(&mut next, &new_number, &employee_id, now)?;
        }

        self.commit(next, now)?;
        self.stored_credential(id)
    }

    fn stored_credential<T: Collection>(&self, id: &str) -> Result<T> {
        T::records(&self.snapshot)
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| Error::internal(format!("{} {id} missing after commit", T::KIND)))
    }

    // === Interchange ===

    /// The stored record set, for writing a backup.
    #[must_use]
    pub fn backup(&self) -> Snapshot {
        self.snapshot.clone()
    }

    /// Replace the whole record set verbatim.
    ///
    /// Nothing is re-derived, so a backup restores to exactly what was
    /// saved; the next read or mutation refreshes as usual.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        self.storage.save_snapshot(&snapshot)?;
        info!(
            "Restored {} employees, {} BOCs, {} VRFs",
            snapshot.employees.len(),
            snapshot.bocs.len(),
            snapshot.vrfs.len()
        );
        self.snapshot = snapshot;
        Ok(())
    }

    /// Add employees from import rows.
    ///
    /// Rows without a name, or whose first and last name match an existing
    /// employee (case-insensitively), are skipped. Credential numbers are
    /// taken as given; unknown ones stay dangling.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is imported then.
    pub fn import_employees(
        &mut self,
        rows: Vec<EmployeePatch>,
        now: DateTime<Utc>,
    ) -> Result<ImportReport> {
        let mut next = self.snapshot.clone();
        let mut report = ImportReport::default();

        for row in rows {
            let first = row.first_name.as_deref().unwrap_or_default().trim();
            let last = row.last_name.as_deref().unwrap_or_default().trim();
            if first.is_empty() && last.is_empty() {
                report.skipped += 1;
                continue;
            }
            let exists = next.employees.iter().any(|e| {
                e.first_name.trim().eq_ignore_ascii_case(first)
                    && e.last_name.trim().eq_ignore_ascii_case(last)
            });
            if exists {
                debug!("Skipping existing employee {} {}", first, last);
                report.skipped += 1;
                continue;
            }

            let no = i64::try_from(next.employees.len()).unwrap_or(i64::MAX) + 1;
            let mut employee = Employee::new(generate_id(), no);
            row.apply_plain_fields(&mut employee);
            if let Some(number) = &row.boc_number {
                *employee.slot_mut(CredentialKind::Boc).number = number.trim().to_string();
            }
            if let Some(number) = &row.vrf_number {
                *employee.slot_mut(CredentialKind::Vrf).number = number.trim().to_string();
            }
            if let Some(badge) = &row.badge {
                set_badge(&mut employee, badge.trim());
            }

            next.employees.push(employee);
            report.added += 1;
        }

        self.commit(next, now)?;
        info!(
            "Imported {} employees, skipped {}",
            report.added, report.skipped
        );
        Ok(report)
    }

    /// Add BOC records from import rows. Blank and duplicate numbers are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is imported then.
    pub fn import_bocs(
        &mut self,
        rows: Vec<CredentialDraft>,
        now: DateTime<Utc>,
    ) -> Result<ImportReport> {
        self.import_credentials::<Boc>(rows, now)
    }

    /// Add VRF records from import rows. Blank and duplicate numbers are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is imported then.
    pub fn import_vrfs(
        &mut self,
        rows: Vec<CredentialDraft>,
        now: DateTime<Utc>,
    ) -> Result<ImportReport> {
        self.import_credentials::<Vrf>(rows, now)
    }

    fn import_credentials<T: Collection>(
        &mut self,
        rows: Vec<CredentialDraft>,
        now: DateTime<Utc>,
    ) -> Result<ImportReport> {
        let mut next = self.snapshot.clone();
        let mut report = ImportReport::default();

        for mut row in rows {
            row.number = row.number.trim().to_string();
            row.assigned_employee_id = None;
            if row.number.is_empty() || find_by_number(T::records(&next), &row.number).is_some() {
                debug!("Skipping {} row '{}'", T::KIND, row.number);
                report.skipped += 1;
                continue;
            }
            T::records_mut(&mut next).push(T::from_draft(generate_id(), row));
            report.added += 1;
        }

        self.commit(next, now)?;
        info!(
            "Imported {} {} records, skipped {}",
            report.added,
            T::KIND,
            report.skipped
        );
        Ok(report)
    }

    // === Preferences ===

    /// The last shown dashboard tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn active_tab(&self) -> Result<ActiveTab> {
        self.storage.active_tab()
    }

    /// Remember the dashboard tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_active_tab(&self, tab: ActiveTab) -> Result<()> {
        self.storage.set_active_tab(tab)
    }

    // === Attachments ===

    /// Store a validated upload for an existing employee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmployeeNotFound`] when the owner does not exist.
    pub fn attach(&self, upload: &NewAttachment, now: DateTime<Utc>) -> Result<AttachmentInsert> {
        if self.snapshot.employee(&upload.employee_id).is_none() {
            return Err(Error::EmployeeNotFound {
                id: upload.employee_id.clone(),
            });
        }
        let inserted = self.storage.insert_attachment(upload, now)?;
        if !inserted.deduplicated {
            info!(
                "Attached {} ({}) to employee {}",
                upload.name, upload.category, upload.employee_id
            );
        }
        Ok(inserted)
    }

    /// List an employee's attachments.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn attachments(
        &self,
        employee_id: &str,
        category: Option<DocumentCategory>,
    ) -> Result<Vec<AttachmentMeta>> {
        self.storage.list_attachments(employee_id, category)
    }

    /// Fetch an attachment with its content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentNotFound`] for an unknown id.
    pub fn attachment(&self, id: i64) -> Result<Attachment> {
        self.storage
            .get_attachment(id)?
            .ok_or(Error::AttachmentNotFound { id })
    }

    /// Delete an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttachmentNotFound`] for an unknown id.
    pub fn remove_attachment(&self, id: i64) -> Result<()> {
        if self.storage.delete_attachment(id)? {
            Ok(())
        } else {
            Err(Error::AttachmentNotFound { id })
        }
    }
}

fn validate_names(employee: &Employee) -> Result<()> {
    if employee.first_name.trim().is_empty() || employee.last_name.trim().is_empty() {
        return Err(Error::validation("first and last name are required"));
    }
    Ok(())
}

fn normalize_draft<T: Credential>(draft: &mut CredentialDraft) -> Result<()> {
    draft.number = draft.number.trim().to_string();
    if draft.number.is_empty() {
        return Err(Error::validation(format!("{} number is required", T::KIND)));
    }
    if draft.expiry.trim().is_empty() {
        return Err(Error::validation(format!("{} expiry date is required", T::KIND)));
    }
    if T::KIND == CredentialKind::Vrf && draft.access.trim().is_empty() {
        return Err(Error::validation("VRF access level is required"));
    }
    draft.comments = draft
        .comments
        .take()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    Ok(())
}

/// Apply the credential fields of a patch through the selection rules.
///
/// The badge goes first so clearing a badge and picking a VRF in one edit
/// works, while setting both is refused.
fn apply_credentials(
    employee: &mut Employee,
    patch: &EmployeePatch,
    next: &mut Snapshot,
) -> Result<()> {
    if let Some(badge) = &patch.badge {
        set_badge(employee, badge.trim());
        if employee.has_badge() {
            drop_back_refs(&mut next.vrfs, &employee.id, "");
        }
    }
    if let Some(number) = &patch.boc_number {
        select_credential(employee, number, &next.bocs)?;
        drop_back_refs(&mut next.bocs, &employee.id, &employee.boc_number);
    }
    if let Some(number) = &patch.vrf_number {
        // A blank VRF alongside a badge is what the form submits; nothing to select.
        if !(number.trim().is_empty() && employee.has_badge()) {
            select_credential(employee, number, &next.vrfs)?;
            drop_back_refs(&mut next.vrfs, &employee.id, &employee.vrf_number);
        }
    }
    Ok(())
}

/// Clear stale back-references to `employee_id` on records other than `keep`.
fn drop_back_refs<T: Credential>(records: &mut [T], employee_id: &str, keep: &str) {
    for record in records.iter_mut() {
        if record.assigned_employee_id() == Some(employee_id) && record.number() != keep {
            let (days, status) = (record.expiry_days(), record.status());
            record.set_derived(days, status, None);
        }
    }
}

fn release_holders(next: &mut Snapshot, kind: CredentialKind, number: &str) {
    for employee in &mut next.employees {
        if employee.credential_number(kind) == number {
            info!("Releasing {} {} from employee {}", kind, number, employee.id);
            employee.slot_mut(kind).clear();
        }
    }
}

/// Give the record `number` to `employee_id`, taking it from anyone else.
fn assign_from_credential<T: Collection>(
    next: &mut Snapshot,
    number: &str,
    employee_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    if next.employee(employee_id).is_none() {
        return Err(Error::EmployeeNotFound {
            id: employee_id.to_string(),
        });
    }

    for employee in &mut next.employees {
        if employee.id != employee_id && employee.credential_number(T::KIND) == number {
            warn!(
                "{} {} moves from employee {} to {}",
                T::KIND,
                number,
                employee.id,
                employee_id
            );
            employee.slot_mut(T::KIND).clear();
        }
    }
    refresh(next, now);

    let Some(mut employee) = next.employee(employee_id).cloned() else {
        return Err(Error::EmployeeNotFound {
            id: employee_id.to_string(),
        });
    };
    select_credential(&mut employee, number, T::records(next))?;
    drop_back_refs(T::records_mut(next), employee_id, number);
    if let Some(slot) = next.employee_mut(employee_id) {
        *slot = employee;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::content_hash;
    use crate::model::DocumentStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
    }

    fn registry() -> Registry {
        crate::logging::init_test_logging();
        Registry::open(Storage::open_in_memory().unwrap()).unwrap()
    }

    fn person(first: &str, last: &str) -> EmployeePatch {
        EmployeePatch {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            ..EmployeePatch::default()
        }
    }

    fn draft(number: &str, expiry: &str) -> CredentialDraft {
        CredentialDraft {
            number: number.to_string(),
            issued: "2023-01-01".to_string(),
            expiry: expiry.to_string(),
            access: "Full Access".to_string(),
            ..CredentialDraft::default()
        }
    }

    #[test]
    fn test_add_employee_numbers_and_persists() {
        let mut registry = registry();
        let a = registry.add_employee(person("Ana", "Silva"), now()).unwrap();
        let b = registry.add_employee(person("Ben", "Okafor"), now()).unwrap();

        assert_eq!(a.no, 1);
        assert_eq!(b.no, 2);
        assert_ne!(a.id, b.id);
        assert_eq!(registry.storage().load_snapshot().unwrap().employees.len(), 2);
    }

    #[test]
    fn test_add_employee_requires_names() {
        let mut registry = registry();
        let err = registry.add_employee(person("Ana", " "), now()).unwrap_err();
        assert!(err.is_user_error());
        assert!(registry.snapshot().employees.is_empty());
    }

    #[test]
    fn test_selecting_boc_assigns_and_syncs() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();

        let employee = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();

        assert_eq!(employee.boc_expiry, "2024-02-01");
        assert_eq!(employee.boc_expiry_days, 27);
        let boc = &registry.snapshot().bocs[0];
        assert_eq!(boc.status, DocumentStatus::Assigned);
        assert_eq!(boc.assigned_employee_id.as_deref(), Some(employee.id.as_str()));
    }

    #[test]
    fn test_assigned_boc_is_candidate_for_holder_only() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let holder = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();
        let other = registry.add_employee(person("Ben", "Okafor"), now()).unwrap();

        assert_eq!(registry.boc_candidates(Some(&holder.id), now()).unwrap().len(), 1);
        assert!(registry.boc_candidates(Some(&other.id), now()).unwrap().is_empty());
        assert!(registry.boc_candidates(None, now()).unwrap().is_empty());

        let err = registry
            .update_employee(
                &other.id,
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..EmployeePatch::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::CredentialUnavailable { .. }));
    }

    #[test]
    fn test_releasing_boc_makes_it_available() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let e = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();

        registry
            .update_employee(
                &e.id,
                EmployeePatch {
                    boc_number: Some(String::new()),
                    ..EmployeePatch::default()
                },
                now(),
            )
            .unwrap();

        let boc = &registry.snapshot().bocs[0];
        assert_eq!(boc.status, DocumentStatus::Available);
        assert!(boc.assigned_employee_id.is_none());
    }

    #[test]
    fn test_editing_to_unknown_boc_keeps_cached_expiry() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let e = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();
        assert_eq!(e.boc_expiry, "2024-02-01");
        assert_eq!(e.boc_expiry_days, 27);

        let edited = registry
            .update_employee(
                &e.id,
                EmployeePatch {
                    boc_number: Some("B-404".to_string()),
                    ..EmployeePatch::default()
                },
                now(),
            )
            .unwrap();

        assert_eq!(edited.boc_number, "B-404");
        assert_eq!(edited.boc_expiry, "2024-02-01");
        assert_eq!(edited.boc_expiry_days, 27);
        let stored = &registry.storage().load_snapshot().unwrap().employees[0];
        assert_eq!(stored.boc_expiry, "2024-02-01");
        assert_eq!(registry.snapshot().bocs[0].status, DocumentStatus::Available);
    }

    #[test]
    fn test_badge_releases_vrf() {
        let mut registry = registry();
        registry.add_vrf(draft("V-1", "2024-03-01"), now()).unwrap();
        let e = registry
            .add_employee(
                EmployeePatch {
                    vrf_number: Some("V-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();
        assert_eq!(registry.snapshot().vrfs[0].status, DocumentStatus::Assigned);

        let updated = registry
            .update_employee(
                &e.id,
                EmployeePatch {
                    badge: Some("BD-1".to_string()),
                    ..EmployeePatch::default()
                },
                now(),
            )
            .unwrap();

        assert_eq!(updated.vrf_number, "");
        assert_eq!(updated.vrf_expiry_days, 0);
        assert_eq!(registry.snapshot().vrfs[0].status, DocumentStatus::Available);
    }

    #[test]
    fn test_badge_and_vrf_together_is_rejected() {
        let mut registry = registry();
        registry.add_vrf(draft("V-1", "2024-03-01"), now()).unwrap();
        let err = registry
            .add_employee(
                EmployeePatch {
                    badge: Some("BD-1".to_string()),
                    vrf_number: Some("V-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::BadgeExcludesVrf { .. }));
        assert!(registry.snapshot().employees.is_empty());
    }

    #[test]
    fn test_duplicate_numbers_rejected() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let b2 = registry.add_boc(draft("B-2", "2024-02-01"), now()).unwrap();

        assert!(matches!(
            registry.add_boc(draft(" B-1 ", "2024-02-01"), now()),
            Err(Error::DuplicateNumber { .. })
        ));
        assert!(matches!(
            registry.update_boc(&b2.id, draft("B-1", "2024-02-01"), now()),
            Err(Error::DuplicateNumber { .. })
        ));
        // The same number is fine in the other collection.
        registry.add_vrf(draft("B-1", "2024-02-01"), now()).unwrap();
    }

    #[test]
    fn test_vrf_requires_access() {
        let mut registry = registry();
        let mut d = draft("V-1", "2024-02-01");
        d.access = String::new();
        assert!(registry.add_vrf(d.clone(), now()).is_err());
        // BOCs ignore the access level.
        d.number = "B-1".to_string();
        assert!(registry.add_boc(d, now()).is_ok());
    }

    #[test]
    fn test_assign_from_credential_side_moves_holder() {
        let mut registry = registry();
        let boc = registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let a = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();
        let b = registry.add_employee(person("Ben", "Okafor"), now()).unwrap();

        let mut d = draft("B-1", "2024-02-01");
        d.assigned_employee_id = Some(b.id.clone());
        let updated = registry.update_boc(&boc.id, d, now()).unwrap();

        assert_eq!(updated.assigned_employee_id.as_deref(), Some(b.id.as_str()));
        let view = registry.view(now());
        assert_eq!(view.employee(&a.id).unwrap().boc_number, "");
        assert_eq!(view.employee(&b.id).unwrap().boc_number, "B-1");
        assert_eq!(view.employee(&b.id).unwrap().boc_expiry_days, 27);
    }

    #[test]
    fn test_add_credential_with_assignee() {
        let mut registry = registry();
        let e = registry.add_employee(person("Ana", "Silva"), now()).unwrap();
        let mut d = draft("B-7", "2024-02-01");
        d.assigned_employee_id = Some(e.id.clone());

        let boc = registry.add_boc(d, now()).unwrap();
        assert_eq!(boc.status, DocumentStatus::Assigned);
        assert_eq!(registry.employee(&e.id, now()).unwrap().boc_number, "B-7");
    }

    #[test]
    fn test_blank_assignee_releases_holder() {
        let mut registry = registry();
        let boc = registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let e = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();

        let mut d = draft("B-1", "2024-02-01");
        d.assigned_employee_id = Some(String::new());
        let updated = registry.update_boc(&boc.id, d, now()).unwrap();

        assert_eq!(updated.status, DocumentStatus::Available);
        assert_eq!(registry.employee(&e.id, now()).unwrap().boc_number, "");
    }

    #[test]
    fn test_rename_carries_holder() {
        let mut registry = registry();
        let boc = registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let e = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();

        registry
            .update_boc(&boc.id, draft("B-100", "2024-03-01"), now())
            .unwrap();

        let e = registry.employee(&e.id, now()).unwrap();
        assert_eq!(e.boc_number, "B-100");
        assert_eq!(e.boc_expiry, "2024-03-01");
        assert_eq!(registry.snapshot().bocs[0].status, DocumentStatus::Assigned);
    }

    #[test]
    fn test_delete_employee_frees_credentials_and_attachments() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();
        let e = registry
            .add_employee(
                EmployeePatch {
                    boc_number: Some("B-1".to_string()),
                    ..person("Ana", "Silva")
                },
                now(),
            )
            .unwrap();
        let upload = NewAttachment {
            employee_id: e.id.clone(),
            category: DocumentCategory::Passport,
            name: "p.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            content: b"pdf".to_vec(),
            content_hash: content_hash(b"pdf"),
        };
        registry.attach(&upload, now()).unwrap();

        registry.delete_employee(&e.id, now()).unwrap();

        assert_eq!(registry.snapshot().bocs[0].status, DocumentStatus::Available);
        assert!(registry.attachments(&e.id, None).unwrap().is_empty());
        assert!(registry.storage().load_snapshot().unwrap().employees.is_empty());
        assert!(registry.delete_employee(&e.id, now()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_attach_requires_employee() {
        let registry = registry();
        let upload = NewAttachment {
            employee_id: "ghost".to_string(),
            category: DocumentCategory::Boc,
            name: "b.png".to_string(),
            mime_type: "image/png".to_string(),
            content: vec![1],
            content_hash: content_hash(&[1]),
        };
        assert!(registry.attach(&upload, now()).unwrap_err().is_not_found());
        assert!(matches!(
            registry.remove_attachment(42),
            Err(Error::AttachmentNotFound { id: 42 })
        ));
    }

    #[test]
    fn test_restore_is_verbatim() {
        let mut registry = registry();
        let mut stale = Boc {
            id: "b1".to_string(),
            boc_number: "B-1".to_string(),
            boc_expiry: "2020-01-01".to_string(),
            boc_expiry_days: 99,
            ..Boc::default()
        };
        stale.status = DocumentStatus::Available;
        let snapshot = Snapshot {
            bocs: vec![stale],
            ..Snapshot::default()
        };

        registry.restore(snapshot.clone()).unwrap();

        assert_eq!(registry.backup(), snapshot);
        assert_eq!(registry.storage().load_snapshot().unwrap(), snapshot);
        // Reads still re-derive.
        assert_eq!(registry.view(now()).bocs[0].status, DocumentStatus::Expired);
    }

    #[test]
    fn test_import_employees_skips_existing_names() {
        let mut registry = registry();
        registry.add_employee(person("Ana", "Silva"), now()).unwrap();

        let rows = vec![
            person("ana", "SILVA"),
            EmployeePatch {
                badge: Some("BD-1".to_string()),
                vrf_number: Some("V-1".to_string()),
                ..person("Ben", "Okafor")
            },
            person("", ""),
        ];
        let report = registry.import_employees(rows, now()).unwrap();

        assert_eq!(report, ImportReport { added: 1, skipped: 2 });
        let ben = &registry.snapshot().employees[1];
        assert_eq!(ben.no, 2);
        assert_eq!(ben.badge, "BD-1");
        assert_eq!(ben.vrf_number, "");
    }

    #[test]
    fn test_import_credentials_skips_duplicates() {
        let mut registry = registry();
        registry.add_boc(draft("B-1", "2024-02-01"), now()).unwrap();

        let report = registry
            .import_bocs(
                vec![
                    draft("B-1", "2024-02-01"),
                    draft("B-2", "2024-01-01"),
                    draft("B-2", "2024-01-01"),
                    draft("", "2024-01-01"),
                ],
                now(),
            )
            .unwrap();

        assert_eq!(report, ImportReport { added: 1, skipped: 3 });
        let b2 = registry.snapshot().boc_by_number("B-2").unwrap();
        assert_eq!(b2.status, DocumentStatus::Expired);
    }

    #[test]
    fn test_active_tab() {
        let registry = registry();
        assert_eq!(registry.active_tab().unwrap(), ActiveTab::Employees);
        registry.set_active_tab(ActiveTab::Airport).unwrap();
        assert_eq!(registry.active_tab().unwrap(), ActiveTab::Airport);
    }
}
