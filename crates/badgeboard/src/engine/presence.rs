//! Presence-on-base (POB) resolution.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::parse_instant;
use crate::model::Employee;

/// Whether an employee is on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    /// Inside the arrival/departure interval.
    #[serde(rename = "IN")]
    In,
    /// Outside it, or dates are missing.
    #[serde(rename = "OUT")]
    Out,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
        }
    }
}

impl Presence {
    /// `IN` iff `arrival <= now <= departure`.
    ///
    /// A missing or malformed bound makes the comparison fail, so the
    /// result is `OUT`.
    #[must_use]
    pub fn resolve(arrival: &str, departure: &str, now: DateTime<Utc>) -> Self {
        match (parse_instant(arrival), parse_instant(departure)) {
            (Some(arrival), Some(departure)) if arrival <= now && now <= departure => Self::In,
            _ => Self::Out,
        }
    }

    /// Presence of an employee at `now`.
    #[must_use]
    pub fn of(employee: &Employee, now: DateTime<Utc>) -> Self {
        Self::resolve(&employee.arrival, &employee.departure, now)
    }

    /// Form preview: `None` ("not set") until both dates are filled in.
    #[must_use]
    pub fn preview(arrival: &str, departure: &str, now: DateTime<Utc>) -> Option<Self> {
        if arrival.trim().is_empty() || departure.trim().is_empty() {
            return None;
        }
        Some(Self::resolve(arrival, departure, now))
    }
}

/// Head counts for the POB widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PobSummary {
    /// All employees.
    pub total: usize,
    /// Employees on site.
    pub inside: usize,
    /// Employees off site.
    pub outside: usize,
}

impl PobSummary {
    /// Count employees by presence at `now`.
    #[must_use]
    pub fn count(employees: &[Employee], now: DateTime<Utc>) -> Self {
        let inside = employees
            .iter()
            .filter(|e| Presence::of(e, now) == Presence::In)
            .count();
        Self {
            total: employees.len(),
            inside,
            outside: employees.len() - inside,
        }
    }
}
