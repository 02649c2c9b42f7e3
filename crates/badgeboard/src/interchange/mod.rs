//! Moving records in and out: JSON backups and CSV spreadsheets.

pub mod backup;
pub mod tabular;

pub use backup::{parse_backup, to_json, DEFAULT_BACKUP_FILE};
pub use tabular::{
    read_bocs, read_employees, read_vrfs, write_bocs, write_employees, write_schedule, write_vrfs,
};
