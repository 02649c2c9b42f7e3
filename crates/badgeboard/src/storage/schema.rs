//! `SQLite` schema definitions for badgeboard.
//!
//! Records are stored as whole JSON documents keyed by collection name, the
//! same layout a backup file uses. Uploaded scans live in their own table
//! as blobs.

/// Document key holding the employee collection.
pub const EMPLOYEES_KEY: &str = "employees";

/// Document key holding the BOC collection.
pub const BOCS_KEY: &str = "bocs";

/// Document key holding the VRF collection.
pub const VRFS_KEY: &str = "vrfs";

/// Document key holding the last shown dashboard tab.
pub const ACTIVE_TAB_KEY: &str = "activeTab";

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the attachments table.
pub const CREATE_ATTACHMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL,
    category TEXT NOT NULL,
    name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    content BLOB NOT NULL,
    content_hash TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
)
";

/// Attachments are always listed per employee and category.
pub const CREATE_ATTACHMENT_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_attachments_owner ON attachments(employee_id, category)
";

/// SQL statement to create an index on `content_hash` for deduplication.
pub const CREATE_ATTACHMENT_HASH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_attachments_hash ON attachments(content_hash)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_ATTACHMENTS_TABLE,
    CREATE_ATTACHMENT_OWNER_INDEX,
    CREATE_ATTACHMENT_HASH_INDEX,
    CREATE_METADATA_TABLE,
];
