//! Error types for badgeboard.
//!
//! This module defines all error types used throughout the badgeboard crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::CredentialKind;

/// The main error type for badgeboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored JSON document could not be decoded.
    #[error("stored document '{key}' is corrupt: {message}")]
    CorruptDocument {
        /// Key of the document in the store.
        key: String,
        /// Description of the decoding failure.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// No employee with the given id.
    #[error("employee not found: {id}")]
    EmployeeNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// No credential record with the given id or number.
    #[error("{kind} not found: {key}")]
    CredentialNotFound {
        /// Which credential collection was searched.
        kind: CredentialKind,
        /// The id or number that was looked up.
        key: String,
    },

    /// A credential number is already used by another record.
    #[error("{kind} number '{number}' already exists")]
    DuplicateNumber {
        /// Which credential collection holds the duplicate.
        kind: CredentialKind,
        /// The duplicated number.
        number: String,
    },

    /// The credential exists but cannot be assigned to this employee.
    #[error("{kind} '{number}' is not available: {reason}")]
    CredentialUnavailable {
        /// Which credential collection the number belongs to.
        kind: CredentialKind,
        /// The requested number.
        number: String,
        /// Why the selection was refused.
        reason: String,
    },

    /// A VRF was selected for an employee that holds a physical badge.
    #[error("employee {employee_id} holds badge '{badge}'; clear it before selecting a VRF")]
    BadgeExcludesVrf {
        /// The employee the selection was made for.
        employee_id: String,
        /// The badge currently held.
        badge: String,
    },

    /// A record failed field validation.
    #[error("invalid record: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    // === Interchange Errors ===
    /// A backup file could not be parsed.
    #[error("invalid backup file format: {message}")]
    InvalidBackup {
        /// Description of the parse failure.
        message: String,
    },

    /// A tabular import row could not be read.
    #[error("import failed at row {row}: {message}")]
    Import {
        /// One-based data row number (header excluded).
        row: usize,
        /// Description of the failure.
        message: String,
    },

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === Attachment Errors ===
    /// An upload was refused before reaching the store.
    #[error("upload rejected: {reason}")]
    UploadRejected {
        /// Why the upload was refused.
        reason: String,
    },

    /// No attachment with the given id.
    #[error("attachment not found: {id}")]
    AttachmentNotFound {
        /// The id that was looked up.
        id: i64,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for badgeboard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an upload rejection.
    #[must_use]
    pub fn upload_rejected(reason: impl Into<String>) -> Self {
        Self::UploadRejected {
            reason: reason.into(),
        }
    }

    /// Create a credential-unavailable error.
    #[must_use]
    pub fn credential_unavailable(
        kind: CredentialKind,
        number: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::CredentialUnavailable {
            kind,
            number: number.into(),
            reason: reason.into(),
        }
    }

    /// Create a credential-not-found error.
    #[must_use]
    pub fn credential_not_found(kind: CredentialKind, key: impl Into<String>) -> Self {
        Self::CredentialNotFound {
            kind,
            key: key.into(),
        }
    }

    /// Check if this error means a looked-up record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EmployeeNotFound { .. }
                | Self::CredentialNotFound { .. }
                | Self::AttachmentNotFound { .. }
        )
    }

    /// Check if this error is a rejected user input rather than a system fault.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateNumber { .. }
                | Self::CredentialUnavailable { .. }
                | Self::BadgeExcludesVrf { .. }
                | Self::Validation { .. }
                | Self::InvalidBackup { .. }
                | Self::Import { .. }
                | Self::UploadRejected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmployeeNotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "employee not found: abc");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_credential_errors_name_the_kind() {
        let err = Error::credential_not_found(CredentialKind::Boc, "B-100");
        assert_eq!(err.to_string(), "BOC not found: B-100");

        let err = Error::DuplicateNumber {
            kind: CredentialKind::Vrf,
            number: "V-7".to_string(),
        };
        assert_eq!(err.to_string(), "VRF number 'V-7' already exists");
    }

    #[test]
    fn test_credential_unavailable_display() {
        let err = Error::credential_unavailable(CredentialKind::Boc, "B-1", "expired");
        let msg = err.to_string();
        assert!(msg.contains("B-1"));
        assert!(msg.contains("expired"));
    }

    #[test]
    fn test_badge_excludes_vrf_display() {
        let err = Error::BadgeExcludesVrf {
            employee_id: "e1".to_string(),
            badge: "BD-9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("e1"));
        assert!(msg.contains("BD-9"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::AttachmentNotFound { id: 3 }.is_not_found());
        assert!(Error::credential_not_found(CredentialKind::Vrf, "x").is_not_found());
        assert!(!Error::internal("x").is_not_found());
    }

    #[test]
    fn test_is_user_error() {
        assert!(Error::validation("first name is required").is_user_error());
        assert!(Error::upload_rejected("too large").is_user_error());
        assert!(!Error::internal("bug").is_user_error());
    }

    #[test]
    fn test_import_error_display() {
        let err = Error::Import {
            row: 4,
            message: "bad date".to_string(),
        };
        assert_eq!(err.to_string(), "import failed at row 4: bad date");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
