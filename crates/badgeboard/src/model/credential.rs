//! BOC and VRF credential records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which credential collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Badge/clearance credential.
    Boc,
    /// Visitor/vehicle record.
    Vrf,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boc => write!(f, "BOC"),
            Self::Vrf => write!(f, "VRF"),
        }
    }
}

/// Derived availability of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// Not expired and not held by anyone.
    #[default]
    Available,
    /// Held by an employee.
    Assigned,
    /// Expiry day count is zero or negative.
    Expired,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Assigned => write!(f, "Assigned"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "assigned" => Ok(Self::Assigned),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Form input for creating or editing a credential record.
///
/// `access` is only meaningful for VRF records and is ignored for BOCs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialDraft {
    /// Credential number.
    pub number: String,
    /// Issue date.
    pub issued: String,
    /// Expiry date.
    pub expiry: String,
    /// Employee to assign the credential to, if any.
    pub assigned_employee_id: Option<String>,
    /// Free-form comments.
    pub comments: Option<String>,
    /// Access level (VRF only).
    pub access: String,
}

/// Common view over BOC and VRF records.
///
/// The consistency engine is written once against this trait and applied
/// to both collections.
pub trait Credential: Clone + fmt::Debug {
    /// Which collection this record type lives in.
    const KIND: CredentialKind;

    /// Build a new record from form input.
    fn from_draft(id: String, draft: CredentialDraft) -> Self;

    /// Overwrite the user-editable fields from form input.
    fn apply_draft(&mut self, draft: CredentialDraft);

    /// Record identifier.
    fn id(&self) -> &str;

    /// Credential number, the key employees reference.
    fn number(&self) -> &str;

    /// Issue date as stored.
    fn issued(&self) -> &str;

    /// Expiry date as stored.
    fn expiry(&self) -> &str;

    /// Cached expiry day count.
    fn expiry_days(&self) -> i64;

    /// Cached status.
    fn status(&self) -> DocumentStatus;

    /// Back-reference to the holding employee.
    fn assigned_employee_id(&self) -> Option<&str>;

    /// Free-form comments.
    fn comments(&self) -> Option<&str>;

    /// Store freshly derived values.
    fn set_derived(&mut self, expiry_days: i64, status: DocumentStatus, holder: Option<String>);

    /// Access level; empty for records that carry none.
    fn access(&self) -> &str {
        ""
    }

    /// The editable fields as form input, assignee left unset.
    fn to_draft(&self) -> CredentialDraft {
        CredentialDraft {
            number: self.number().to_string(),
            issued: self.issued().to_string(),
            expiry: self.expiry().to_string(),
            assigned_employee_id: None,
            comments: self.comments().map(str::to_string),
            access: self.access().to_string(),
        }
    }
}

/// Badge/clearance credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Boc {
    /// Record identifier.
    pub id: String,
    /// Credential number.
    pub boc_number: String,
    /// Issue date.
    pub boc_issued: String,
    /// Expiry date.
    pub boc_expiry: String,
    /// Days until expiry, as of the last refresh.
    pub boc_expiry_days: i64,
    /// Status, as of the last refresh.
    pub status: DocumentStatus,
    /// Holding employee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_employee_id: Option<String>,
    /// Free-form comments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Credential for Boc {
    const KIND: CredentialKind = CredentialKind::Boc;

    fn from_draft(id: String, draft: CredentialDraft) -> Self {
        let mut boc = Self {
            id,
            ..Self::default()
        };
        boc.apply_draft(draft);
        boc
    }

    fn apply_draft(&mut self, draft: CredentialDraft) {
        self.boc_number = draft.number;
        self.boc_issued = draft.issued;
        self.boc_expiry = draft.expiry;
        self.assigned_employee_id = draft.assigned_employee_id.filter(|id| !id.is_empty());
        self.comments = draft.comments;
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn number(&self) -> &str {
        &self.boc_number
    }

    fn issued(&self) -> &str {
        &self.boc_issued
    }

    fn expiry(&self) -> &str {
        &self.boc_expiry
    }

    fn expiry_days(&self) -> i64 {
        self.boc_expiry_days
    }

    fn status(&self) -> DocumentStatus {
        self.status
    }

    fn assigned_employee_id(&self) -> Option<&str> {
        self.assigned_employee_id.as_deref()
    }

    fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    fn set_derived(&mut self, expiry_days: i64, status: DocumentStatus, holder: Option<String>) {
        self.boc_expiry_days = expiry_days;
        self.status = status;
        self.assigned_employee_id = holder;
    }
}

/// Visitor/vehicle record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vrf {
    /// Record identifier.
    pub id: String,
    /// Record number.
    pub vrf_number: String,
    /// Issue date.
    pub vrf_issued: String,
    /// Expiry date.
    pub vrf_expiry: String,
    /// Days until expiry, as of the last refresh.
    pub vrf_expiry_days: i64,
    /// Status, as of the last refresh.
    pub status: DocumentStatus,
    /// Holding employee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_employee_id: Option<String>,
    /// Access level granted by the record.
    pub access: String,
    /// Free-form comments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Credential for Vrf {
    const KIND: CredentialKind = CredentialKind::Vrf;

    fn from_draft(id: String, draft: CredentialDraft) -> Self {
        let mut vrf = Self {
            id,
            ..Self::default()
        };
        vrf.apply_draft(draft);
        vrf
    }

    fn apply_draft(&mut self, draft: CredentialDraft) {
        self.vrf_number = draft.number;
        self.vrf_issued = draft.issued;
        self.vrf_expiry = draft.expiry;
        self.assigned_employee_id = draft.assigned_employee_id.filter(|id| !id.is_empty());
        self.comments = draft.comments;
        self.access = draft.access;
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn number(&self) -> &str {
        &self.vrf_number
    }

    fn issued(&self) -> &str {
        &self.vrf_issued
    }

    fn expiry(&self) -> &str {
        &self.vrf_expiry
    }

    fn expiry_days(&self) -> i64 {
        self.vrf_expiry_days
    }

    fn status(&self) -> DocumentStatus {
        self.status
    }

    fn assigned_employee_id(&self) -> Option<&str> {
        self.assigned_employee_id.as_deref()
    }

    fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    fn set_derived(&mut self, expiry_days: i64, status: DocumentStatus, holder: Option<String>) {
        self.vrf_expiry_days = expiry_days;
        self.status = status;
        self.assigned_employee_id = holder;
    }

    fn access(&self) -> &str {
        &self.access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(number: &str) -> CredentialDraft {
        CredentialDraft {
            number: number.to_string(),
            issued: "2024-01-01".to_string(),
            expiry: "2025-01-01".to_string(),
            assigned_employee_id: Some(String::new()),
            comments: Some("gate 3".to_string()),
            access: "Full Access".to_string(),
        }
    }

    #[test]
    fn test_boc_serializes_camel_case() {
        let boc = Boc::from_draft("b1".to_string(), draft("B-1"));
        let json = serde_json::to_value(&boc).unwrap();

        assert_eq!(json["bocNumber"], "B-1");
        assert_eq!(json["bocExpiryDays"], 0);
        assert_eq!(json["status"], "Available");
        // An empty assignee from a form means "not assigned".
        assert!(json.get("assignedEmployeeId").is_none());
    }

    #[test]
    fn test_vrf_keeps_access() {
        let vrf = Vrf::from_draft("v1".to_string(), draft("V-1"));
        assert_eq!(vrf.access, "Full Access");
        assert_eq!(vrf.number(), "V-1");
        assert_eq!(Vrf::KIND, CredentialKind::Vrf);
    }

    #[test]
    fn test_deserialize_persisted_shape() {
        let json = r#"{
            "id": "x",
            "bocNumber": "B-9",
            "bocIssued": "2024-01-01",
            "bocExpiry": "2024-06-01",
            "bocExpiryDays": 12,
            "status": "Assigned",
            "assignedEmployeeId": "e1"
        }"#;
        let boc: Boc = serde_json::from_str(json).unwrap();
        assert_eq!(boc.status, DocumentStatus::Assigned);
        assert_eq!(boc.assigned_employee_id(), Some("e1"));
        assert!(boc.comments.is_none());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("expired".parse::<DocumentStatus>(), Ok(DocumentStatus::Expired));
        assert_eq!(" Available ".parse::<DocumentStatus>(), Ok(DocumentStatus::Available));
        assert!("lost".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn test_set_derived() {
        let mut boc = Boc::from_draft("b1".to_string(), draft("B-1"));
        boc.set_derived(-3, DocumentStatus::Expired, Some("e1".to_string()));
        assert_eq!(boc.expiry_days(), -3);
        assert_eq!(boc.status(), DocumentStatus::Expired);
        assert_eq!(boc.assigned_employee_id(), Some("e1"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(CredentialKind::Boc.to_string(), "BOC");
        assert_eq!(CredentialKind::Vrf.to_string(), "VRF");
    }

    #[test]
    fn test_to_draft_drops_assignee() {
        let mut vrf = Vrf::from_draft("v1".to_string(), draft("V-1"));
        vrf.assigned_employee_id = Some("e1".to_string());

        let back = vrf.to_draft();
        assert_eq!(back.number, "V-1");
        assert_eq!(back.access, "Full Access");
        assert!(back.assigned_employee_id.is_none());

        let boc = Boc::from_draft("b1".to_string(), draft("B-1"));
        assert_eq!(boc.to_draft().access, "");
    }
}
