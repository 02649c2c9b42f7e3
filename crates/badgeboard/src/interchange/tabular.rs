//! CSV import and export.
//!
//! Columns are matched by exact header text, so files exported here (or by
//! a spreadsheet with the same headings) import back. Missing columns read
//! as empty. A date cell holding a bare number is a spreadsheet serial day.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use csv::StringRecord;

use crate::engine::expiry::{display_date, serial_to_date_string};
use crate::engine::Presence;
use crate::error::{Error, Result};
use crate::model::{Boc, Credential, CredentialDraft, Employee, EmployeePatch, Vrf};
use crate::query::AirportSchedule;

/// Employee export headings.
pub const EMPLOYEE_HEADERS: &[&str] = &[
    "No#",
    "Name",
    "Nationality",
    "Passport Number",
    "Position",
    "Arrival",
    "Departure",
    "POB",
    "BOC Number",
    "BOC Expiry",
    "BOC Days",
    "Badge",
    "VRF Number",
    "VRF Expiry",
    "VRF Days",
    "Note",
];

/// BOC export headings.
pub const BOC_HEADERS: &[&str] = &[
    "BOC Number",
    "Issue Date",
    "Expiry Date",
    "Days Until Expiry",
    "Status",
    "Comments",
];

/// VRF export headings.
pub const VRF_HEADERS: &[&str] = &[
    "VRF Number",
    "Issue Date",
    "Expiry Date",
    "Days Until Expiry",
    "Access Level",
    "Status",
    "Comments",
];

/// Airport schedule export headings.
pub const SCHEDULE_HEADERS: &[&str] = &["Type", "Name", "Position", "Date", "Time"];

const EMPTY_CELL: &str = "-";

/// One data row with header lookup.
struct Row<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &str) -> String {
        self.headers
            .iter()
            .position(|h| h.trim() == column)
            .and_then(|idx| self.record.get(idx))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    /// Like [`Row::get`], with the export placeholder `-` read as empty.
    fn get_optional(&self, column: &str) -> String {
        let value = self.get(column);
        if value == EMPTY_CELL {
            String::new()
        } else {
            value
        }
    }

    fn get_date(&self, column: &str) -> String {
        date_cell(&self.get_optional(column))
    }
}

/// Convert a spreadsheet serial to `YYYY-MM-DD`; anything else is kept.
fn date_cell(raw: &str) -> String {
    raw.parse::<f64>()
        .ok()
        .and_then(serial_to_date_string)
        .unwrap_or_else(|| raw.to_string())
}

fn export_date(raw: &str) -> String {
    display_date(raw).unwrap_or_else(|| EMPTY_CELL.to_string())
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        EMPTY_CELL
    } else {
        value
    }
}

fn read_rows<R: Read, T>(input: R, mut parse: impl FnMut(&Row<'_>) -> T) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| Error::Import {
            row: idx + 1,
            message: e.to_string(),
        })?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(parse(&Row {
            headers: &headers,
            record: &record,
        }));
    }
    Ok(rows)
}

/// Write employees in the given order; `No#` is the row position.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_employees<W: Write>(
    output: W,
    employees: &[&Employee],
    now: DateTime<Utc>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(EMPLOYEE_HEADERS)?;

    for (idx, e) in employees.iter().enumerate() {
        let (vrf_number, vrf_expiry, vrf_days) = if e.has_badge() {
            (EMPTY_CELL.to_string(), EMPTY_CELL.to_string(), EMPTY_CELL.to_string())
        } else {
            (
                e.vrf_number.clone(),
                export_date(&e.vrf_expiry),
                e.vrf_expiry_days.to_string(),
            )
        };
        writer.write_record([
            (idx + 1).to_string(),
            e.full_name(),
            e.nationality.clone(),
            e.passport_number.clone(),
            e.position.clone(),
            export_date(&e.arrival),
            export_date(&e.departure),
            Presence::of(e, now).to_string(),
            e.boc_number.clone(),
            export_date(&e.boc_expiry),
            e.boc_expiry_days.to_string(),
            or_placeholder(&e.badge).to_string(),
            vrf_number,
            vrf_expiry,
            vrf_days,
            or_placeholder(&e.note).to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Read employee import rows.
///
/// `Name` is split at the first space into first and last name.
///
/// # Errors
///
/// Returns [`Error::Import`] for a malformed row and [`Error::Csv`] for an
/// unreadable header; nothing is returned partially.
pub fn read_employees<R: Read>(input: R) -> Result<Vec<EmployeePatch>> {
    read_rows(input, |row| {
        let name = row.get("Name");
        let (first, last) = name.split_once(' ').unwrap_or((name.as_str(), ""));
        EmployeePatch {
            first_name: Some(first.trim().to_string()),
            last_name: Some(last.trim().to_string()),
            nationality: Some(row.get("Nationality")),
            passport_number: Some(row.get("Passport Number")),
            position: Some(row.get("Position")),
            arrival: Some(row.get_date("Arrival")),
            departure: Some(row.get_date("Departure")),
            boc_number: Some(row.get_optional("BOC Number")),
            badge: Some(row.get_optional("Badge")),
            vrf_number: Some(row.get_optional("VRF Number")),
            note: Some(row.get_optional("Note")),
            ..EmployeePatch::default()
        }
    })
}

fn write_credentials<W: Write, T: Credential>(
    output: W,
    headers: &[&str],
    records: &[T],
    with_access: bool,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(headers)?;

    for record in records {
        let mut cells = vec![
            record.number().to_string(),
            export_date(record.issued()),
            export_date(record.expiry()),
            record.expiry_days().to_string(),
        ];
        if with_access {
            cells.push(record.access().to_string());
        }
        cells.push(record.status().to_string());
        cells.push(or_placeholder(record.comments().unwrap_or_default()).to_string());
        writer.write_record(&cells)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write BOC records.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_bocs<W: Write>(output: W, bocs: &[Boc]) -> Result<()> {
    write_credentials(output, BOC_HEADERS, bocs, false)
}

/// Write VRF records.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_vrfs<W: Write>(output: W, vrfs: &[Vrf]) -> Result<()> {
    write_credentials(output, VRF_HEADERS, vrfs, true)
}

fn read_credentials<R: Read>(
    input: R,
    number_column: &str,
    with_access: bool,
) -> Result<Vec<CredentialDraft>> {
    read_rows(input, |row| CredentialDraft {
        number: row.get(number_column),
        issued: row.get_date("Issue Date"),
        expiry: row.get_date("Expiry Date"),
        assigned_employee_id: None,
        comments: Some(row.get_optional("Comments")).filter(|c| !c.is_empty()),
        access: if with_access {
            row.get("Access Level")
        } else {
            String::new()
        },
    })
}

/// Read BOC import rows.
///
/// # Errors
///
/// As [`read_employees`].
pub fn read_bocs<R: Read>(input: R) -> Result<Vec<CredentialDraft>> {
    read_credentials(input, "BOC Number", false)
}

/// Read VRF import rows.
///
/// # Errors
///
/// As [`read_employees`].
pub fn read_vrfs<R: Read>(input: R) -> Result<Vec<CredentialDraft>> {
    read_credentials(input, "VRF Number", true)
}

/// Write the airport schedule, arrivals first.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_schedule<W: Write>(output: W, schedule: &AirportSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(SCHEDULE_HEADERS)?;
    for entry in schedule.rows() {
        writer.write_record([
            entry.movement.to_string(),
            entry.name.clone(),
            entry.position.clone(),
            entry.date_label(),
            entry.time_label(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
    }

    fn to_string(write: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_employee_export_masks_vrf_for_badge_holders() {
        let mut e = Employee::new("e1".to_string(), 9);
        e.first_name = "Ana".to_string();
        e.last_name = "Silva".to_string();
        e.arrival = "2024-01-01T08:00".to_string();
        e.departure = "2024-01-10".to_string();
        e.badge = "BD-1".to_string();
        e.vrf_expiry_days = 12;

        let csv = to_string(|buf| write_employees(buf, &[&e], now()));
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], EMPLOYEE_HEADERS.join(","));
        assert_eq!(
            lines[1],
            "1,Ana Silva,,,,2024-01-01,2024-01-10,IN,,-,0,BD-1,-,-,-,-"
        );
    }

    #[test]
    fn test_employee_import_splits_name_once() {
        let input = "Name,Position,Arrival,Badge,Note\n\
                     Maria da Silva,Welder,45292,-,\n\
                     Solo,,,BD-2,night shift\n";
        let rows = read_employees(input.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].first_name.as_deref(), Some("Maria"));
        assert_eq!(rows[0].last_name.as_deref(), Some("da Silva"));
        assert_eq!(rows[0].arrival.as_deref(), Some("2024-01-01"));
        assert_eq!(rows[0].badge.as_deref(), Some(""));
        assert_eq!(rows[1].last_name.as_deref(), Some(""));
        assert_eq!(rows[1].badge.as_deref(), Some("BD-2"));
        assert_eq!(rows[1].note.as_deref(), Some("night shift"));
        // Columns absent from the file read as empty.
        assert_eq!(rows[0].nationality.as_deref(), Some(""));
    }

    #[test]
    fn test_credential_export_then_import() {
        let boc = Boc {
            id: "b1".to_string(),
            boc_number: "B-1".to_string(),
            boc_issued: "2023-01-01T00:00:00.000Z".to_string(),
            boc_expiry: "2024-02-01".to_string(),
            boc_expiry_days: 27,
            status: DocumentStatus::Assigned,
            assigned_employee_id: Some("e1".to_string()),
            comments: None,
        };

        let csv = to_string(|buf| write_bocs(buf, &[boc]));
        assert!(csv.contains("B-1,2023-01-01,2024-02-01,27,Assigned,-"));

        let drafts = read_bocs(csv.as_bytes()).unwrap();
        assert_eq!(drafts[0].number, "B-1");
        assert_eq!(drafts[0].expiry, "2024-02-01");
        assert!(drafts[0].comments.is_none());
    }

    #[test]
    fn test_vrf_columns_include_access() {
        let vrf = Vrf {
            vrf_number: "V-1".to_string(),
            access: "Zone A".to_string(),
            comments: Some("escort".to_string()),
            ..Vrf::default()
        };
        let csv = to_string(|buf| write_vrfs(buf, &[vrf]));
        assert!(csv.starts_with(&VRF_HEADERS.join(",")));
        assert!(csv.contains("V-1,-,-,0,Zone A,Available,escort"));

        let drafts = read_vrfs(csv.as_bytes()).unwrap();
        assert_eq!(drafts[0].access, "Zone A");
        assert_eq!(drafts[0].comments.as_deref(), Some("escort"));
    }

    #[test]
    fn test_blank_rows_are_ignored() {
        let input = "BOC Number,Expiry Date\nB-1,2024-02-01\n,\n";
        assert_eq!(read_bocs(input.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_schedule_export() {
        let mut e = Employee::new("e1".to_string(), 1);
        e.first_name = "Ana".to_string();
        e.last_name = "Silva".to_string();
        e.position = "Medic".to_string();
        e.arrival = "2024-01-08T14:30".to_string();

        let schedule = AirportSchedule::build(&[e], now(), Duration::days(7), None);
        let csv = to_string(|buf| write_schedule(buf, &schedule));
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Type,Name,Position,Date,Time");
        assert_eq!(lines[1], "Arrival,Ana Silva,Medic,\"Mon, Jan 8\",02:30 PM");
    }
}
