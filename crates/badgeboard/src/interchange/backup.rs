//! JSON backup files.
//!
//! A backup is the stored record set as pretty-printed JSON with the three
//! top-level arrays `employees`, `bocs` and `vrfs`.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Snapshot;

/// File name used when no output path is given.
pub const DEFAULT_BACKUP_FILE: &str = "security-department-data.json";

/// Serialize a snapshot as a backup document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parse a backup document.
///
/// All three arrays must be present; unknown top-level keys are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidBackup`] if the text is not a backup.
pub fn parse_backup(text: &str) -> Result<Snapshot> {
    serde_json::from_str(text).map_err(|e| Error::InvalidBackup {
        message: e.to_string(),
    })
}

/// Write a backup file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save(snapshot: &Snapshot, path: &Path) -> Result<()> {
    fs::write(path, to_json(snapshot)?)?;
    debug!("Wrote backup to {}", path.display());
    Ok(())
}

/// Read and parse a backup file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read and
/// [`Error::InvalidBackup`] if it does not parse.
pub fn load(path: &Path) -> Result<Snapshot> {
    let text = fs::read_to_string(path)?;
    parse_backup(&text)
}
