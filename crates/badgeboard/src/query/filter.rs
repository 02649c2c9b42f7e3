//! Employee search, filters and sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::engine::{parse_instant, Presence};
use crate::model::Employee;

/// Presence dimension of the employee filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PobFilter {
    /// No restriction.
    #[default]
    All,
    /// On site only.
    In,
    /// Off site only.
    Out,
}

impl FromStr for PobFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(format!("unknown POB filter: {other} (expected all, in or out)")),
        }
    }
}

/// Expiry day-count bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryRange {
    /// No restriction.
    #[default]
    All,
    /// Seven days or fewer, expired included.
    UpTo7,
    /// Eight to fourteen days.
    From8To14,
    /// Fifteen to thirty days.
    From15To30,
    /// More than thirty days.
    Over30,
}

impl ExpiryRange {
    /// Whether a day count falls in the bucket.
    #[must_use]
    pub fn contains(self, days: i64) -> bool {
        match self {
            Self::All => true,
            Self::UpTo7 => days <= 7,
            Self::From8To14 => (8..=14).contains(&days),
            Self::From15To30 => (15..=30).contains(&days),
            Self::Over30 => days > 30,
        }
    }
}

impl FromStr for ExpiryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "All" => Ok(Self::All),
            "<=7" | "≤7" => Ok(Self::UpTo7),
            "8-14" | "7-14" => Ok(Self::From8To14),
            "15-30" => Ok(Self::From15To30),
            ">30" => Ok(Self::Over30),
            other => Err(format!(
                "unknown expiry range: {other} (expected all, <=7, 8-14, 15-30 or >30)"
            )),
        }
    }
}

impl fmt::Display for ExpiryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::UpTo7 => "<=7",
            Self::From8To14 => "8-14",
            Self::From15To30 => "15-30",
            Self::Over30 => ">30",
        })
    }
}

/// Blood types accepted by the blood type filter.
pub const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Every filter dimension of the employee table. Defaults match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Case-insensitive substring over name, nationality, passport,
    /// position, BOC number and VRF number.
    pub search: String,
    /// Nationality substring.
    pub nationality: String,
    /// Position substring.
    pub position: String,
    /// Presence.
    pub pob: PobFilter,
    /// BOC day-count bucket.
    pub boc_expiry: ExpiryRange,
    /// VRF day-count bucket; ignored for badge holders. `Over30` is not
    /// offered for VRFs and is treated as `All`.
    pub vrf_expiry: ExpiryRange,
    /// Exact blood type; `None` for all.
    pub blood_type: Option<String>,
}

impl EmployeeFilter {
    /// Whether an employee passes every dimension at `now`.
    #[must_use]
    pub fn matches(&self, employee: &Employee, now: DateTime<Utc>) -> bool {
        let search = self.search.to_lowercase();
        if !search.is_empty() {
            let haystacks = [
                employee.full_name(),
                employee.nationality.clone(),
                employee.passport_number.clone(),
                employee.position.clone(),
                employee.boc_number.clone(),
                employee.vrf_number.clone(),
            ];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&search)) {
                return false;
            }
        }

        if !contains_ci(&employee.nationality, &self.nationality)
            || !contains_ci(&employee.position, &self.position)
        {
            return false;
        }

        let pob_ok = match self.pob {
            PobFilter::All => true,
            PobFilter::In => Presence::of(employee, now) == Presence::In,
            PobFilter::Out => Presence::of(employee, now) == Presence::Out,
        };
        if !pob_ok || !self.boc_expiry.contains(employee.boc_expiry_days) {
            return false;
        }

        if !employee.has_badge()
            && self.vrf_expiry != ExpiryRange::Over30
            && !self.vrf_expiry.contains(employee.vrf_expiry_days)
        {
            return false;
        }

        self.blood_type
            .as_deref()
            .map_or(true, |wanted| employee.blood_type == wanted)
    }

    /// Employees passing the filter, in input order.
    #[must_use]
    pub fn apply<'a>(&self, employees: &'a [Employee], now: DateTime<Utc>) -> Vec<&'a Employee> {
        employees.iter().filter(|e| self.matches(e, now)).collect()
    }
}

fn contains_ci(value: &str, needle: &str) -> bool {
    needle.is_empty() || value.to_lowercase().contains(&needle.to_lowercase())
}

/// Column to sort the employee table by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Roster number.
    No,
    /// Given name.
    FirstName,
    /// Family name.
    #[default]
    LastName,
    /// Nationality.
    Nationality,
    /// Passport number.
    PassportNumber,
    /// Position.
    Position,
    /// Arrival instant.
    Arrival,
    /// Departure instant.
    Departure,
    /// BOC number.
    BocNumber,
    /// BOC day count.
    BocExpiryDays,
    /// Badge number.
    Badge,
    /// VRF number.
    VrfNumber,
    /// VRF day count.
    VrfExpiryDays,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.replace(['-', '_'], "").to_ascii_lowercase();
        Ok(match key.as_str() {
            "no" => Self::No,
            "firstname" => Self::FirstName,
            "lastname" | "name" => Self::LastName,
            "nationality" => Self::Nationality,
            "passportnumber" | "passport" => Self::PassportNumber,
            "position" => Self::Position,
            "arrival" => Self::Arrival,
            "departure" => Self::Departure,
            "bocnumber" | "boc" => Self::BocNumber,
            "bocexpirydays" | "bocdays" => Self::BocExpiryDays,
            "badge" => Self::Badge,
            "vrfnumber" | "vrf" => Self::VrfNumber,
            "vrfexpirydays" | "vrfdays" => Self::VrfExpiryDays,
            _ => return Err(format!("unknown sort key: {s}")),
        })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Sort column and direction. Defaults to last name ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    /// Column.
    pub key: SortKey,
    /// Direction.
    pub direction: SortDirection,
}

impl SortConfig {
    /// Clicking a column header: same key flips direction, a new key sorts ascending.
    #[must_use]
    pub fn toggle(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Self { key, direction }
    }

    /// Compare two employees by this configuration.
    #[must_use]
    pub fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
        let ordering = match self.key {
            SortKey::No => a.no.cmp(&b.no),
            SortKey::FirstName => text(&a.first_name, &b.first_name),
            SortKey::LastName => text(&a.last_name, &b.last_name),
            SortKey::Nationality => text(&a.nationality, &b.nationality),
            SortKey::PassportNumber => text(&a.passport_number, &b.passport_number),
            SortKey::Position => text(&a.position, &b.position),
            SortKey::Arrival => instant(&a.arrival, &b.arrival),
            SortKey::Departure => instant(&a.departure, &b.departure),
            SortKey::BocNumber => text(&a.boc_number, &b.boc_number),
            SortKey::BocExpiryDays => a.boc_expiry_days.cmp(&b.boc_expiry_days),
            SortKey::Badge => text(&a.badge, &b.badge),
            SortKey::VrfNumber => text(&a.vrf_number, &b.vrf_number),
            SortKey::VrfExpiryDays => a.vrf_expiry_days.cmp(&b.vrf_expiry_days),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Sort in place; ties keep their input order.
    pub fn sort(&self, employees: &mut [&Employee]) {
        employees.sort_by(|a, b| self.compare(a, b));
    }
}

fn text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Unparseable dates sort before every real date.
fn instant(a: &str, b: &str) -> Ordering {
    parse_instant(a).cmp(&parse_instant(b))
}
