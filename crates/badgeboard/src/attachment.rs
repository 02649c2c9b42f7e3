//! Scanned documents attached to employees.
//!
//! Uploads are checked against the configured size limit and MIME
//! allow-list before they reach the store. Content is hashed with BLAKE3 so
//! re-uploading the same file for the same employee and category is a no-op.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AttachmentConfig;
use crate::error::{Error, Result};

/// Which document a scan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    /// Passport scan.
    Passport,
    /// BOC scan.
    Boc,
    /// VRF scan.
    Vrf,
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passport => write!(f, "passport"),
            Self::Boc => write!(f, "boc"),
            Self::Vrf => write!(f, "vrf"),
        }
    }
}

impl FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passport" => Ok(Self::Passport),
            "boc" => Ok(Self::Boc),
            "vrf" => Ok(Self::Vrf),
            other => Err(format!("unknown document category: {other}")),
        }
    }
}

/// Guess a MIME type from a file name's extension.
#[must_use]
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// BLAKE3 hex digest of attachment content.
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Check an upload's name and size, returning its MIME type.
///
/// # Errors
///
/// Returns [`Error::UploadRejected`] for empty files, files over the size
/// limit, and types outside the allow-list.
pub fn validate_upload(
    name: &str,
    size_bytes: u64,
    config: &AttachmentConfig,
) -> Result<&'static str> {
    if size_bytes == 0 {
        return Err(Error::upload_rejected(format!("{name} is empty")));
    }
    if size_bytes > config.max_size_bytes {
        return Err(Error::upload_rejected(format!(
            "{name} is {size_bytes} bytes; the limit is {} bytes",
            config.max_size_bytes
        )));
    }
    let mime = mime_for_name(name)
        .ok_or_else(|| Error::upload_rejected(format!("{name} has an unsupported file type")))?;
    if !config.allowed_mime_types.iter().any(|allowed| allowed == mime) {
        return Err(Error::upload_rejected(format!("{mime} uploads are not allowed")));
    }
    Ok(mime)
}

/// A validated upload ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    /// Owning employee.
    pub employee_id: String,
    /// Document category.
    pub category: DocumentCategory,
    /// Original file name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// File content.
    pub content: Vec<u8>,
    /// BLAKE3 hex digest of `content`.
    pub content_hash: String,
}

impl NewAttachment {
    /// Validate an upload and prepare it for storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadRejected`] when [`validate_upload`] refuses it.
    pub fn from_upload(
        employee_id: impl Into<String>,
        category: DocumentCategory,
        name: impl Into<String>,
        content: Vec<u8>,
        config: &AttachmentConfig,
    ) -> Result<Self> {
        let name = name.into();
        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        let mime = validate_upload(&name, size, config)?;
        Ok(Self {
            employee_id: employee_id.into(),
            category,
            name,
            mime_type: mime.to_string(),
            content_hash: content_hash(&content),
            content,
        })
    }
}

/// Stored attachment without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentMeta {
    /// Row id.
    pub id: i64,
    /// Owning employee.
    pub employee_id: String,
    /// Document category.
    pub category: DocumentCategory,
    /// Original file name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Content size.
    pub size_bytes: u64,
    /// BLAKE3 hex digest.
    pub content_hash: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

/// Stored attachment with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Metadata.
    pub meta: AttachmentMeta,
    /// File content.
    pub content: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AttachmentConfig {
        AttachmentConfig::default()
    }

    #[test]
    fn test_mime_for_name() {
        assert_eq!(mime_for_name("scan.PDF"), Some("application/pdf"));
        assert_eq!(mime_for_name("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_name("photo.jpg"), Some("image/jpeg"));
        assert_eq!(mime_for_name("photo.png"), Some("image/png"));
        assert_eq!(mime_for_name("notes.docx"), None);
        assert_eq!(mime_for_name("README"), None);
    }

    #[test]
    fn test_validate_upload_accepts_pdf() {
        assert_eq!(
            validate_upload("passport.pdf", 1024, &config()).unwrap(),
            "application/pdf"
        );
    }

    #[test]
    fn test_validate_upload_size_limit() {
        let limit = config().max_size_bytes;
        assert!(validate_upload("a.png", limit, &config()).is_ok());
        let err = validate_upload("a.png", limit + 1, &config()).unwrap_err();
        assert!(matches!(err, Error::UploadRejected { .. }));
        assert!(validate_upload("a.png", 0, &config()).is_err());
    }

    #[test]
    fn test_validate_upload_respects_allow_list() {
        let config = AttachmentConfig {
            allowed_mime_types: vec!["application/pdf".to_string()],
            ..AttachmentConfig::default()
        };
        assert!(validate_upload("a.pdf", 10, &config).is_ok());
        assert!(validate_upload("a.png", 10, &config).is_err());
        assert!(validate_upload("a.exe", 10, &config).is_err());
    }

    #[test]
    fn test_from_upload_hashes_content() {
        let upload = NewAttachment::from_upload(
            "e1",
            DocumentCategory::Passport,
            "p.pdf",
            b"%PDF-1.4".to_vec(),
            &config(),
        )
        .unwrap();
        assert_eq!(upload.mime_type, "application/pdf");
        assert_eq!(upload.content_hash, content_hash(b"%PDF-1.4"));
        assert_eq!(upload.content_hash.len(), 64);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("BOC".parse::<DocumentCategory>(), Ok(DocumentCategory::Boc));
        assert_eq!(DocumentCategory::Passport.to_string(), "passport");
        assert!("visa".parse::<DocumentCategory>().is_err());
    }
}
