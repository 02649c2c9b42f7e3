//! Calendar parsing and expiry day counts.
//!
//! Every date is interpreted in UTC. Date-only strings are UTC midnight and
//! zone-less date-times are UTC wall clock, so the same stored string yields
//! the same day count regardless of where the tool runs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Spreadsheet serial day number of 1970-01-01.
pub const SPREADSHEET_UNIX_EPOCH_SERIAL: f64 = 25_569.0;

/// Zone-less date-time layouts accepted from forms and spreadsheets.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a stored date or date-time into a UTC instant.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` and `M/D/YYYY`.
/// Returns `None` for empty or unrecognised input.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(midnight(date));
    }

    parse_slash_date(raw).map(midnight)
}

/// Parse a stored date into a calendar date (UTC).
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_instant(raw).map(|dt| dt.date_naive())
}

/// `M/D/YYYY`, the locale layout older spreadsheets were exported with.
fn parse_slash_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days from `now` until `expiry`, rounded up.
///
/// Negative once the expiry has passed.
#[must_use]
pub fn days_between(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expiry - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Day count for a stored expiry string.
///
/// Missing and unparseable dates count as 0, which the status resolver
/// treats as expired.
#[must_use]
pub fn days_until(expiry: &str, now: DateTime<Utc>) -> i64 {
    parse_instant(expiry).map_or(0, |expiry| days_between(expiry, now))
}

/// Convert a spreadsheet serial day number into a `YYYY-MM-DD` string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn serial_to_date_string(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - SPREADSHEET_UNIX_EPOCH_SERIAL) * 86_400.0 * 1000.0).round();
    if millis.abs() > 8.64e15 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Render a stored date as `YYYY-MM-DD`, or `None` when it does not parse.
#[must_use]
pub fn display_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Urgency band used to colour day counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBand {
    /// Zero or fewer days left.
    Expired,
    /// Ten days or fewer.
    Critical,
    /// Twenty days or fewer.
    Warning,
    /// More than twenty days.
    Ok,
}

impl ExpiryBand {
    /// Classify a day count.
    #[must_use]
    pub fn of(days: i64) -> Self {
        match days {
            i64::MIN..=0 => Self::Expired,
            1..=10 => Self::Critical,
            11..=20 => Self::Warning,
            _ => Self::Ok,
        }
    }
}
