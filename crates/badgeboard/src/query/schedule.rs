//! Upcoming airport arrivals and departures.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::engine::parse_instant;
use crate::model::Employee;

/// Arrival or departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Movement {
    /// Coming on site.
    Arrival,
    /// Leaving site.
    Departure,
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arrival => write!(f, "Arrival"),
            Self::Departure => write!(f, "Departure"),
        }
    }
}

/// One row of the airport schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    /// Arrival or departure.
    pub movement: Movement,
    /// Employee id.
    pub employee_id: String,
    /// Full name.
    pub name: String,
    /// Position.
    pub position: String,
    /// When the movement happens.
    pub at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Short weekday and date, e.g. `Mon, Jan 8`.
    #[must_use]
    pub fn date_label(&self) -> String {
        self.at.format("%a, %b %-d").to_string()
    }

    /// Twelve-hour clock time, e.g. `02:30 PM`.
    #[must_use]
    pub fn time_label(&self) -> String {
        self.at.format("%I:%M %p").to_string()
    }
}

/// Arrivals and departures inside `[now, now + window]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AirportSchedule {
    /// Soonest first.
    pub arrivals: Vec<ScheduleEntry>,
    /// Latest first.
    pub departures: Vec<ScheduleEntry>,
}

impl AirportSchedule {
    /// Build the schedule for `now`, optionally narrowed by a
    /// case-insensitive search over name and position.
    #[must_use]
    pub fn build(
        employees: &[Employee],
        now: DateTime<Utc>,
        window: Duration,
        search: Option<&str>,
    ) -> Self {
        let until = now + window;
        let needle = search.map(str::to_lowercase).filter(|s| !s.is_empty());
        let visible = |e: &&Employee| {
            needle.as_deref().map_or(true, |n| {
                e.full_name().to_lowercase().contains(n) || e.position.to_lowercase().contains(n)
            })
        };

        let entries = |movement: Movement| {
            employees
                .iter()
                .filter(&visible)
                .filter_map(|e| {
                    let raw = match movement {
                        Movement::Arrival => &e.arrival,
                        Movement::Departure => &e.departure,
                    };
                    let at = parse_instant(raw)?;
                    (now <= at && at <= until).then(|| ScheduleEntry {
                        movement,
                        employee_id: e.id.clone(),
                        name: e.full_name(),
                        position: e.position.clone(),
                        at,
                    })
                })
                .collect::<Vec<_>>()
        };

        let mut arrivals = entries(Movement::Arrival);
        arrivals.sort_by_key(|entry| entry.at);
        let mut departures = entries(Movement::Departure);
        departures.sort_by(|a, b| b.at.cmp(&a.at));

        Self {
            arrivals,
            departures,
        }
    }

    /// Arrivals followed by departures, the export row order.
    pub fn rows(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.arrivals.iter().chain(&self.departures)
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty() && self.departures.is_empty()
    }
}
