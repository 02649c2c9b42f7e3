//! Storage layer for badgeboard.
//!
//! The record set is kept as three JSON documents (`employees`, `bocs`,
//! `vrfs`) written together in one transaction, so a reader never sees a
//! half-applied mutation. Attachments are stored as blobs next to them.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::attachment::{Attachment, AttachmentMeta, DocumentCategory, NewAttachment};
use crate::error::{Error, Result};
use crate::model::{ActiveTab, Snapshot};

use schema::{ACTIVE_TAB_KEY, BOCS_KEY, EMPLOYEES_KEY, VRFS_KEY};

/// Persistent store for records, preferences and attachments.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Connection,
}

/// Result of storing an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentInsert {
    /// Row id of the stored (or already present) attachment.
    pub id: i64,
    /// Whether identical content was already stored for this owner and category.
    pub deduplicated: bool,
}

impl Storage {
    /// Open or create a database at the given path.
    ///
    /// Creates parent directories as needed and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Records ===

    /// Load the stored record set.
    ///
    /// Missing collections load as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptDocument`] when a stored collection does not
    /// decode.
    pub fn load_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            employees: self.read_document(EMPLOYEES_KEY)?.unwrap_or_default(),
            bocs: self.read_document(BOCS_KEY)?.unwrap_or_default(),
            vrfs: self.read_document(VRFS_KEY)?.unwrap_or_default(),
        })
    }

    /// Replace the stored record set in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails; nothing is written
    /// in that case.
    pub fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.write_snapshot(snapshot, None).map(|_| ())
    }

    /// Replace the stored record set and drop every attachment of a removed
    /// employee, both in one transaction. Returns the number of attachments
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or either write fails; nothing is
    /// written in that case.
    pub fn save_snapshot_deleting_attachments(
        &mut self,
        snapshot: &Snapshot,
        employee_id: &str,
    ) -> Result<usize> {
        self.write_snapshot(snapshot, Some(employee_id))
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot, purge: Option<&str>) -> Result<usize> {
        let employees = serde_json::to_string(&snapshot.employees)?;
        let bocs = serde_json::to_string(&snapshot.bocs)?;
        let vrfs = serde_json::to_string(&snapshot.vrfs)?;

        let tx = self.conn.transaction()?;
        for (key, value) in [
            (EMPLOYEES_KEY, employees),
            (BOCS_KEY, bocs),
            (VRFS_KEY, vrfs),
        ] {
            upsert_document(&tx, key, &value)?;
        }
        let purged = match purge {
            Some(employee_id) => {
                tx.execute("DELETE FROM attachments WHERE employee_id = ?1", [employee_id])?
            }
            None => 0,
        };
        tx.commit()?;

        debug!(
            "Saved {} employees, {} BOCs, {} VRFs",
            snapshot.employees.len(),
            snapshot.bocs.len(),
            snapshot.vrfs.len()
        );
        if let Some(employee_id) = purge.filter(|_| purged > 0) {
            info!("Removed {} attachments of employee {}", purged, employee_id);
        }
        Ok(purged)
    }

    // === Preferences ===

    /// The last shown dashboard tab.
    ///
    /// An unreadable value falls back to the default tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn active_tab(&self) -> Result<ActiveTab> {
        match self.read_document::<ActiveTab>(ACTIVE_TAB_KEY) {
            Ok(tab) => Ok(tab.unwrap_or_default()),
            Err(Error::CorruptDocument { message, .. }) => {
                warn!("Ignoring unreadable active tab: {}", message);
                Ok(ActiveTab::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Remember the dashboard tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_active_tab(&self, tab: ActiveTab) -> Result<()> {
        upsert_document(&self.conn, ACTIVE_TAB_KEY, &encode(&tab)?)
    }

    fn read_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM documents WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|e| Error::CorruptDocument {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
    }

    // === Attachments ===

    /// Store an attachment.
    ///
    /// Identical content already stored for the same employee and category
    /// is not stored again; its existing id is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_attachment(
        &self,
        upload: &NewAttachment,
        uploaded_at: DateTime<Utc>,
    ) -> Result<AttachmentInsert> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                r"
                SELECT id FROM attachments
                WHERE employee_id = ?1 AND category = ?2 AND content_hash = ?3
                ",
                params![
                    upload.employee_id,
                    upload.category.to_string(),
                    upload.content_hash
                ],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            debug!(
                "Skipping duplicate attachment with hash {}",
                &upload.content_hash[..16.min(upload.content_hash.len())]
            );
            return Ok(AttachmentInsert {
                id,
                deduplicated: true,
            });
        }

        let size = i64::try_from(upload.content.len()).unwrap_or(i64::MAX);
        self.conn.execute(
            r"
            INSERT INTO attachments
                (employee_id, category, name, mime_type, size_bytes, content, content_hash, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                upload.employee_id,
                upload.category.to_string(),
                upload.name,
                upload.mime_type,
                size,
                upload.content,
                upload.content_hash,
                uploaded_at.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Stored attachment {} for employee {}", id, upload.employee_id);
        Ok(AttachmentInsert {
            id,
            deduplicated: false,
        })
    }

    /// List an employee's attachments, optionally for one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_attachments(
        &self,
        employee_id: &str,
        category: Option<DocumentCategory>,
    ) -> Result<Vec<AttachmentMeta>> {
        let category = category.map(|c| c.to_string());
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, employee_id, category, name, mime_type, size_bytes, content_hash, uploaded_at
            FROM attachments
            WHERE employee_id = ?1 AND (?2 IS NULL OR category = ?2)
            ORDER BY uploaded_at ASC, id ASC
            ",
        )?;
        let rows = stmt
            .query_map(params![employee_id, category], Self::row_to_meta)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fetch an attachment with its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_attachment(&self, id: i64) -> Result<Option<Attachment>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, employee_id, category, name, mime_type, size_bytes, content_hash, uploaded_at, content
                FROM attachments WHERE id = ?1
                ",
                [id],
                |row| {
                    Ok(Attachment {
                        meta: Self::row_to_meta(row)?,
                        content: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// Delete one attachment. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_attachment(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM attachments WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    fn row_to_meta(row: &rusqlite::Row) -> rusqlite::Result<AttachmentMeta> {
        let category: String = row.get(2)?;
        let size: i64 = row.get(5)?;
        let uploaded_at: String = row.get(7)?;

        let category = category.parse().unwrap_or_else(|e| {
            warn!("{}, treating as passport", e);
            DocumentCategory::Passport
        });
        let uploaded_at = DateTime::parse_from_rfc3339(&uploaded_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();

        Ok(AttachmentMeta {
            id: row.get(0)?,
            employee_id: row.get(1)?,
            category,
            name: row.get(3)?,
            mime_type: row.get(4)?,
            size_bytes: u64::try_from(size).unwrap_or(0),
            content_hash: row.get(6)?,
            uploaded_at,
        })
    }

    // === Statistics ===

    /// Database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let snapshot = self.load_snapshot()?;

        let (attachments, attachment_bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM attachments",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let last_saved: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(updated_at) FROM documents WHERE key IN (?1, ?2, ?3)",
                [EMPLOYEES_KEY, BOCS_KEY, VRFS_KEY],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        let last_saved = last_saved
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok())
            .map(|dt| dt.and_utc());

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            employees: snapshot.employees.len(),
            bocs: snapshot.bocs.len(),
            vrfs: snapshot.vrfs.len(),
            attachments: u64::try_from(attachments).unwrap_or(0),
            attachment_bytes: u64::try_from(attachment_bytes).unwrap_or(0),
            last_saved,
            schema_version: migrations::schema_version(&self.conn)?,
            db_size_bytes,
        })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn upsert_document(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO documents (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        ",
        params![key, value],
    )?;
    Ok(())
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Stored employees.
    pub employees: usize,
    /// Stored BOC records.
    pub bocs: usize,
    /// Stored VRF records.
    pub vrfs: usize,
    /// Stored attachments.
    pub attachments: u64,
    /// Total attachment content size.
    pub attachment_bytes: u64,
    /// When the record set was last written.
    pub last_saved: Option<DateTime<Utc>>,
    /// Schema version of the database.
    pub schema_version: i32,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
