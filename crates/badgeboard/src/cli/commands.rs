//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and how their
//! arguments map onto library inputs.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::attachment::DocumentCategory;
use crate::model::{ActiveTab, CredentialDraft, DocumentStatus, EmployeePatch};
use crate::query::{
    EmployeeFilter, ExpiryRange, PobFilter, SortConfig, SortDirection, SortKey, BLOOD_TYPES,
};

/// Employee commands.
#[derive(Debug, Subcommand)]
pub enum EmployeeCommand {
    /// Add an employee
    Add(EmployeeFields),

    /// Edit an employee; only the given fields change
    Edit {
        /// Employee id
        id: String,

        /// Fields to change
        #[command(flatten)]
        fields: EmployeeFields,
    },

    /// Delete an employee and its attachments
    Delete {
        /// Employee id
        id: String,
    },

    /// List employees
    List(EmployeeListCommand),

    /// Show one employee
    Show {
        /// Employee id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Editable employee fields. Pass an empty string to clear a field.
#[derive(Debug, Clone, Default, Args)]
pub struct EmployeeFields {
    /// Roster number
    #[arg(long)]
    pub no: Option<i64>,

    /// Given name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Family name
    #[arg(long)]
    pub last_name: Option<String>,

    /// Nationality
    #[arg(long)]
    pub nationality: Option<String>,

    /// Passport number
    #[arg(long)]
    pub passport: Option<String>,

    /// Position
    #[arg(long)]
    pub position: Option<String>,

    /// Arrival date or date-time
    #[arg(long)]
    pub arrival: Option<String>,

    /// Departure date or date-time
    #[arg(long)]
    pub departure: Option<String>,

    /// BOC number to select
    #[arg(long)]
    pub boc: Option<String>,

    /// Physical badge number; clears any VRF
    #[arg(long)]
    pub badge: Option<String>,

    /// VRF number to select
    #[arg(long)]
    pub vrf: Option<String>,

    /// E-mail address
    #[arg(long)]
    pub email: Option<String>,

    /// Mobile phone
    #[arg(long)]
    pub phone: Option<String>,

    /// Blood type
    #[arg(long, value_parser = parse_blood_type)]
    pub blood_type: Option<String>,

    /// Free-form note
    #[arg(long)]
    pub note: Option<String>,
}

impl From<EmployeeFields> for EmployeePatch {
    fn from(fields: EmployeeFields) -> Self {
        Self {
            no: fields.no,
            first_name: fields.first_name,
            last_name: fields.last_name,
            nationality: fields.nationality,
            passport_number: fields.passport,
            position: fields.position,
            arrival: fields.arrival,
            departure: fields.departure,
            boc_number: fields.boc,
            badge: fields.badge,
            vrf_number: fields.vrf,
            email: fields.email,
            mobile_phone: fields.phone,
            blood_type: fields.blood_type,
            note: fields.note,
        }
    }
}

/// Blood type argument; the empty string clears it.
fn parse_blood_type(s: &str) -> Result<String, String> {
    if s.is_empty() || BLOOD_TYPES.contains(&s) {
        Ok(s.to_string())
    } else {
        Err(format!("expected one of {}", BLOOD_TYPES.join(", ")))
    }
}

/// Employee search, filter and sort options.
#[derive(Debug, Clone, Default, Args)]
pub struct EmployeeQueryArgs {
    /// Search name, nationality, passport, position, BOC and VRF numbers
    #[arg(short, long)]
    pub search: Option<String>,

    /// Nationality contains
    #[arg(long)]
    pub nationality: Option<String>,

    /// Position contains
    #[arg(long)]
    pub position: Option<String>,

    /// Presence: all, in or out
    #[arg(long, default_value = "all")]
    pub pob: PobFilter,

    /// BOC days left: all, <=7, 8-14, 15-30 or >30
    #[arg(long, default_value = "all")]
    pub boc_expiry: ExpiryRange,

    /// VRF days left: all, <=7, 8-14 or 15-30
    #[arg(long, default_value = "all")]
    pub vrf_expiry: ExpiryRange,

    /// Exact blood type
    #[arg(long, value_parser = parse_blood_type)]
    pub blood_type: Option<String>,

    /// Sort column (e.g. lastName, no, arrival, bocExpiryDays)
    #[arg(long, default_value = "lastName")]
    pub sort: SortKey,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

impl EmployeeQueryArgs {
    /// The filter these options describe.
    #[must_use]
    pub fn filter(&self) -> EmployeeFilter {
        EmployeeFilter {
            search: self.search.clone().unwrap_or_default(),
            nationality: self.nationality.clone().unwrap_or_default(),
            position: self.position.clone().unwrap_or_default(),
            pob: self.pob,
            boc_expiry: self.boc_expiry,
            vrf_expiry: self.vrf_expiry,
            blood_type: self.blood_type.clone().filter(|b| !b.is_empty()),
        }
    }

    /// The sort order these options describe.
    #[must_use]
    pub fn sort_config(&self) -> SortConfig {
        SortConfig {
            key: self.sort,
            direction: if self.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        }
    }
}

/// Employee list arguments.
#[derive(Debug, Args)]
pub struct EmployeeListCommand {
    /// Filters and sort order
    #[command(flatten)]
    pub query: EmployeeQueryArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// BOC and VRF commands.
#[derive(Debug, Subcommand)]
pub enum CredentialCommand {
    /// Add a record
    Add(CredentialFields),

    /// Edit a record by id or number; only the given fields change
    Edit {
        /// Record id or number
        key: String,

        /// Fields to change
        #[command(flatten)]
        fields: CredentialFields,
    },

    /// List records
    List {
        /// Only records with this status
        #[arg(long)]
        status: Option<DocumentStatus>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Records that can be selected for an employee
    Candidates {
        /// Employee id; omit for a new employee
        #[arg(short, long)]
        employee: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Editable credential fields.
#[derive(Debug, Clone, Default, Args)]
pub struct CredentialFields {
    /// Record number
    #[arg(long)]
    pub number: Option<String>,

    /// Issue date
    #[arg(long)]
    pub issued: Option<String>,

    /// Expiry date
    #[arg(long)]
    pub expiry: Option<String>,

    /// Employee id to assign to; an empty string releases the record
    #[arg(long)]
    pub assign: Option<String>,

    /// Comments
    #[arg(long)]
    pub comments: Option<String>,

    /// Access level (VRF only)
    #[arg(long)]
    pub access: Option<String>,
}

impl CredentialFields {
    /// Overlay the given fields on `base`.
    #[must_use]
    pub fn merge_into(self, mut base: CredentialDraft) -> CredentialDraft {
        if let Some(number) = self.number {
            base.number = number;
        }
        if let Some(issued) = self.issued {
            base.issued = issued;
        }
        if let Some(expiry) = self.expiry {
            base.expiry = expiry;
        }
        if let Some(comments) = self.comments {
            base.comments = Some(comments).filter(|c| !c.trim().is_empty());
        }
        if let Some(access) = self.access {
            base.access = access;
        }
        base.assigned_employee_id = self.assign;
        base
    }
}

/// Presence summary arguments.
#[derive(Debug, Args)]
pub struct PobCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Airport schedule arguments.
#[derive(Debug, Args)]
pub struct AirportCommand {
    /// Narrow by name or position
    #[arg(short, long)]
    pub search: Option<String>,

    /// Days ahead to include (defaults to the configured window)
    #[arg(short, long)]
    pub days: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Expiry notification arguments.
#[derive(Debug, Args)]
pub struct NotifyCommand {
    /// Warning threshold in days (defaults to the configured value)
    #[arg(short, long)]
    pub days: Option<i64>,

    /// List what would be sent without sending
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for the list
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Collections that can be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportTarget {
    /// Employee roster
    Employees,
    /// BOC records
    Bocs,
    /// VRF records
    Vrfs,
}

/// Tables that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    /// Employee roster (filtered and sorted)
    Employees,
    /// BOC records
    Bocs,
    /// VRF records
    Vrfs,
    /// Upcoming arrivals and departures
    Airport,
}

/// CSV import arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// What the file contains
    #[arg(value_enum)]
    pub target: ImportTarget,

    /// CSV file to read
    pub file: PathBuf,
}

/// CSV export arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// What to export
    #[arg(value_enum)]
    pub target: ExportTarget,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Employee filters (employees only)
    #[command(flatten)]
    pub query: EmployeeQueryArgs,
}

/// Backup commands.
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write all records to a JSON file
    Save {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all records with a JSON backup
    Restore {
        /// Backup file
        file: PathBuf,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Attachment commands.
#[derive(Debug, Subcommand)]
pub enum AttachCommand {
    /// Upload a PDF, JPEG or PNG for an employee
    Upload {
        /// Employee id
        employee: String,

        /// Document category: passport, boc or vrf
        category: DocumentCategory,

        /// File to upload
        file: PathBuf,
    },

    /// List an employee's attachments
    List {
        /// Employee id
        employee: String,

        /// Only this category
        #[arg(long)]
        category: Option<DocumentCategory>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Save an attachment's content to a file
    Get {
        /// Attachment id
        id: i64,

        /// Output file (defaults to the stored name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an attachment
    Remove {
        /// Attachment id
        id: i64,
    },
}

/// Active tab commands.
#[derive(Debug, Subcommand)]
pub enum TabCommand {
    /// Show the stored tab
    Show,

    /// Store a tab: employees, airport, boc or vrf
    Set {
        /// Tab name
        tab: ActiveTab,
    },
}

/// Storage statistics arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_fields_to_patch() {
        let fields = EmployeeFields {
            first_name: Some("Ana".to_string()),
            passport: Some("P1".to_string()),
            badge: Some(String::new()),
            ..EmployeeFields::default()
        };
        let patch = EmployeePatch::from(fields);
        assert_eq!(patch.first_name.as_deref(), Some("Ana"));
        assert_eq!(patch.passport_number.as_deref(), Some("P1"));
        assert_eq!(patch.badge.as_deref(), Some(""));
        assert!(patch.last_name.is_none());
    }

    #[test]
    fn test_blood_type_parser() {
        assert_eq!(parse_blood_type("AB-"), Ok("AB-".to_string()));
        assert_eq!(parse_blood_type(""), Ok(String::new()));
        assert!(parse_blood_type("C+").is_err());
    }

    #[test]
    fn test_query_args_to_filter_and_sort() {
        let args = EmployeeQueryArgs {
            search: Some("ana".to_string()),
            pob: PobFilter::In,
            blood_type: Some(String::new()),
            sort: SortKey::No,
            desc: true,
            ..EmployeeQueryArgs::default()
        };
        let filter = args.filter();
        assert_eq!(filter.search, "ana");
        assert_eq!(filter.pob, PobFilter::In);
        assert!(filter.blood_type.is_none());

        let sort = args.sort_config();
        assert_eq!(sort.key, SortKey::No);
        assert_eq!(sort.direction, SortDirection::Descending);
    }

    #[test]
    fn test_credential_fields_merge() {
        let base = CredentialDraft {
            number: "B-1".to_string(),
            expiry: "2024-06-01".to_string(),
            comments: Some("old".to_string()),
            ..CredentialDraft::default()
        };
        let fields = CredentialFields {
            expiry: Some("2025-06-01".to_string()),
            comments: Some(" ".to_string()),
            ..CredentialFields::default()
        };

        let merged = fields.merge_into(base);
        assert_eq!(merged.number, "B-1");
        assert_eq!(merged.expiry, "2025-06-01");
        assert!(merged.comments.is_none());
        // No --assign keeps whoever holds it.
        assert!(merged.assigned_employee_id.is_none());
    }
}
