//! Employee records.

use serde::{Deserialize, Serialize};

use super::credential::CredentialKind;

/// A reference to an uploaded document, as carried by older backups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentRef {
    /// Document identifier.
    pub id: String,
    /// Original file name.
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Where the document can be fetched from.
    pub url: String,
    /// Upload timestamp.
    pub upload_date: String,
}

/// Per-category document references attached to an employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeDocuments {
    /// Passport scans.
    pub passport: Vec<DocumentRef>,
    /// BOC scans.
    pub boc: Vec<DocumentRef>,
    /// VRF scans.
    pub vrf: Vec<DocumentRef>,
}

/// A person tracked by the security department.
///
/// The `boc*` and `vrf*` expiry fields are snapshots of the referenced
/// credential, refreshed whenever the reference is re-synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Employee {
    /// Record identifier.
    pub id: String,
    /// Roster number.
    pub no: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Nationality.
    pub nationality: String,
    /// Passport number.
    pub passport_number: String,
    /// Job position.
    pub position: String,
    /// Arrival on site.
    pub arrival: String,
    /// Departure from site.
    pub departure: String,
    /// Referenced BOC number, empty when none.
    pub boc_number: String,
    /// Cached expiry of the referenced BOC.
    pub boc_expiry: String,
    /// Cached expiry day count of the referenced BOC.
    pub boc_expiry_days: i64,
    /// Physical badge number. Excludes a VRF.
    pub badge: String,
    /// Referenced VRF number, empty when none.
    pub vrf_number: String,
    /// Cached expiry of the referenced VRF.
    pub vrf_expiry: String,
    /// Cached expiry day count of the referenced VRF.
    pub vrf_expiry_days: i64,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone.
    pub mobile_phone: String,
    /// Blood type.
    pub blood_type: String,
    /// Free-form note.
    pub note: String,
    /// Legacy document references, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<EmployeeDocuments>,
}

/// Mutable view of one credential reference on an employee.
#[derive(Debug)]
pub struct CredentialSlot<'a> {
    /// Referenced number.
    pub number: &'a mut String,
    /// Cached expiry.
    pub expiry: &'a mut String,
    /// Cached day count.
    pub expiry_days: &'a mut i64,
}

impl CredentialSlot<'_> {
    /// Reset the reference and its cached fields.
    pub fn clear(&mut self) {
        self.number.clear();
        self.expiry.clear();
        *self.expiry_days = 0;
    }
}

impl Employee {
    /// Create an empty employee with the given id and roster number.
    #[must_use]
    pub fn new(id: String, no: i64) -> Self {
        Self {
            id,
            no,
            ..Self::default()
        }
    }

    /// First and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether a physical badge is held.
    #[must_use]
    pub fn has_badge(&self) -> bool {
        !self.badge.is_empty()
    }

    /// The referenced number for a credential kind.
    #[must_use]
    pub fn credential_number(&self, kind: CredentialKind) -> &str {
        match kind {
            CredentialKind::Boc => &self.boc_number,
            CredentialKind::Vrf => &self.vrf_number,
        }
    }

    /// The cached expiry and day count for a credential kind.
    #[must_use]
    pub fn credential_expiry(&self, kind: CredentialKind) -> (&str, i64) {
        match kind {
            CredentialKind::Boc => (&self.boc_expiry, self.boc_expiry_days),
            CredentialKind::Vrf => (&self.vrf_expiry, self.vrf_expiry_days),
        }
    }

    /// Borrow the reference fields for a credential kind.
    pub fn slot_mut(&mut self, kind: CredentialKind) -> CredentialSlot<'_> {
        match kind {
            CredentialKind::Boc => CredentialSlot {
                number: &mut self.boc_number,
                expiry: &mut self.boc_expiry,
                expiry_days: &mut self.boc_expiry_days,
            },
            CredentialKind::Vrf => CredentialSlot {
                number: &mut self.vrf_number,
                expiry: &mut self.vrf_expiry,
                expiry_days: &mut self.vrf_expiry_days,
            },
        }
    }
}

/// A partial employee edit, as submitted by a form or command line.
///
/// `None` leaves a field untouched. Credential fields are applied through
/// the consistency rules rather than copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeePatch {
    /// Roster number.
    pub no: Option<i64>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Nationality.
    pub nationality: Option<String>,
    /// Passport number.
    pub passport_number: Option<String>,
    /// Job position.
    pub position: Option<String>,
    /// Arrival on site.
    pub arrival: Option<String>,
    /// Departure from site.
    pub departure: Option<String>,
    /// BOC to select; empty string releases the current one.
    pub boc_number: Option<String>,
    /// Badge to set; empty string removes it.
    pub badge: Option<String>,
    /// VRF to select; empty string releases the current one.
    pub vrf_number: Option<String>,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Contact phone.
    pub mobile_phone: Option<String>,
    /// Blood type.
    pub blood_type: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
}

impl EmployeePatch {
    /// Copy the plain (non-credential) fields onto an employee.
    pub fn apply_plain_fields(&self, employee: &mut Employee) {
        fn set(target: &mut String, value: Option<&String>) {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        if let Some(no) = self.no {
            employee.no = no;
        }
        set(&mut employee.first_name, self.first_name.as_ref());
        set(&mut employee.last_name, self.last_name.as_ref());
        set(&mut employee.nationality, self.nationality.as_ref());
        set(&mut employee.passport_number, self.passport_number.as_ref());
        set(&mut employee.position, self.position.as_ref());
        set(&mut employee.arrival, self.arrival.as_ref());
        set(&mut employee.departure, self.departure.as_ref());
        set(&mut employee.email, self.email.as_ref());
        set(&mut employee.mobile_phone, self.mobile_phone.as_ref());
        set(&mut employee.blood_type, self.blood_type.as_ref());
        set(&mut employee.note, self.note.as_ref());
    }
}
