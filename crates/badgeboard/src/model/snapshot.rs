//! The whole record set held by the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::credential::{Boc, Credential, Vrf};
use super::employee::Employee;

/// All employees, BOCs and VRFs at one point in time.
///
/// This is also the backup file layout: `{ employees, bocs, vrfs }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Employee records.
    pub employees: Vec<Employee>,
    /// Badge/clearance credentials.
    pub bocs: Vec<Boc>,
    /// Visitor/vehicle records.
    pub vrfs: Vec<Vrf>,
}

impl Snapshot {
    /// Find an employee by id.
    #[must_use]
    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// Find a mutable employee by id.
    pub fn employee_mut(&mut self, id: &str) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|e| e.id == id)
    }

    /// Find a BOC by number.
    #[must_use]
    pub fn boc_by_number(&self, number: &str) -> Option<&Boc> {
        find_by_number(&self.bocs, number)
    }

    /// Find a VRF by number.
    #[must_use]
    pub fn vrf_by_number(&self, number: &str) -> Option<&Vrf> {
        find_by_number(&self.vrfs, number)
    }

    /// Total number of records across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.employees.len() + self.bocs.len() + self.vrfs.len()
    }

    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Find a credential by number in a collection.
pub(crate) fn find_by_number<'a, T: Credential>(records: &'a [T], number: &str) -> Option<&'a T> {
    if number.is_empty() {
        return None;
    }
    records.iter().find(|r| r.number() == number)
}

/// The dashboard tab last shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTab {
    /// Employee roster.
    #[default]
    Employees,
    /// Airport schedule.
    Airport,
    /// BOC records.
    Boc,
    /// VRF records.
    Vrf,
}

impl fmt::Display for ActiveTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employees => write!(f, "employees"),
            Self::Airport => write!(f, "airport"),
            Self::Boc => write!(f, "boc"),
            Self::Vrf => write!(f, "vrf"),
        }
    }
}

impl FromStr for ActiveTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employees" => Ok(Self::Employees),
            "airport" => Ok(Self::Airport),
            "boc" => Ok(Self::Boc),
            "vrf" => Ok(Self::Vrf),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}
