//! Expiry notifications.
//!
//! A record is reported while it still has at least one day left and no
//! more than the configured threshold.

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::model::{Credential, CredentialKind, Employee, Snapshot};

/// An upcoming credential expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Credential collection.
    pub kind: CredentialKind,
    /// Credential number.
    pub number: String,
    /// Expiry date as stored.
    pub expiry: String,
    /// Whole days left.
    pub days_remaining: i64,
    /// Holding employee id.
    pub employee_id: Option<String>,
    /// Holding employee name.
    pub employee_name: Option<String>,
}

impl Notification {
    /// One-line subject, e.g. `BOC B-12 expires in 3 days`.
    #[must_use]
    pub fn subject(&self) -> String {
        let unit = if self.days_remaining == 1 { "day" } else { "days" };
        format!(
            "{} {} expires in {} {}",
            self.kind, self.number, self.days_remaining, unit
        )
    }

    /// Message body naming the holder, if any.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.employee_name {
            Some(name) => format!(
                "{} {} held by {} expires on {}.",
                self.kind, self.number, name, self.expiry
            ),
            None => format!(
                "Unassigned {} {} expires on {}.",
                self.kind, self.number, self.expiry
            ),
        }
    }
}

/// Records in a refreshed snapshot expiring within `threshold_days`,
/// soonest first. BOCs come before VRFs on equal day counts.
#[must_use]
pub fn expiring(snapshot: &Snapshot, threshold_days: i64) -> Vec<Notification> {
    let mut out = collect(&snapshot.bocs, &snapshot.employees, threshold_days);
    out.extend(collect(&snapshot.vrfs, &snapshot.employees, threshold_days));
    out.sort_by_key(|n| n.days_remaining);
    out
}

fn collect<T: Credential>(
    records: &[T],
    employees: &[Employee],
    threshold_days: i64,
) -> Vec<Notification> {
    records
        .iter()
        .filter(|r| r.expiry_days() > 0 && r.expiry_days() <= threshold_days)
        .map(|r| {
            let holder = r
                .assigned_employee_id()
                .and_then(|id| employees.iter().find(|e| e.id == id));
            Notification {
                kind: T::KIND,
                number: r.number().to_string(),
                expiry: r.expiry().to_string(),
                days_remaining: r.expiry_days(),
                employee_id: holder.map(|e| e.id.clone()),
                employee_name: holder.map(Employee::full_name),
            }
        })
        .collect()
}

/// Somewhere notifications are delivered to.
pub trait NotificationSink {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn deliver(&mut self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log as e-mail style messages.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    recipient: Option<String>,
}

impl LogSink {
    /// A sink addressing messages to `recipient`.
    #[must_use]
    pub fn new(recipient: Option<String>) -> Self {
        Self { recipient }
    }
}

impl NotificationSink for LogSink {
    fn deliver(&mut self, notification: &Notification) -> Result<()> {
        warn!(
            to = self.recipient.as_deref().unwrap_or("security"),
            subject = %notification.subject(),
            "{}",
            notification.message()
        );
        Ok(())
    }
}

impl NotificationSink for Vec<Notification> {
    fn deliver(&mut self, notification: &Notification) -> Result<()> {
        self.push(notification.clone());
        Ok(())
    }
}

/// Deliver every notification, returning how many were sent.
///
/// # Errors
///
/// Stops at the first delivery failure.
pub fn dispatch(sink: &mut dyn NotificationSink, notifications: &[Notification]) -> Result<usize> {
    for notification in notifications {
        sink.deliver(notification)?;
    }
    Ok(notifications.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Boc, Vrf};

    fn snapshot() -> Snapshot {
        let mut holder = Employee::new("e1".to_string(), 1);
        holder.first_name = "Ana".to_string();
        holder.last_name = "Silva".to_string();

        let boc = |number: &str, days: i64, holder: Option<&str>| Boc {
            id: number.to_string(),
            boc_number: number.to_string(),
            boc_expiry: "2024-01-10".to_string(),
            boc_expiry_days: days,
            assigned_employee_id: holder.map(str::to_string),
            ..Boc::default()
        };

        Snapshot {
            employees: vec![holder],
            bocs: vec![
                boc("B-0", 0, None),
                boc("B-3", 3, Some("e1")),
                boc("B-7", 7, None),
                boc("B-8", 8, None),
            ],
            vrfs: vec![Vrf {
                id: "v".to_string(),
                vrf_number: "V-1".to_string(),
                vrf_expiry_days: 1,
                ..Vrf::default()
            }],
        }
    }

    #[test]
    fn test_threshold_excludes_expired_and_far() {
        let numbers: Vec<_> = expiring(&snapshot(), 7)
            .into_iter()
            .map(|n| n.number)
            .collect();
        assert_eq!(numbers, vec!["V-1", "B-3", "B-7"]);
    }

    #[test]
    fn test_holder_is_named() {
        let notifications = expiring(&snapshot(), 7);
        let b3 = notifications.iter().find(|n| n.number == "B-3").unwrap();
        assert_eq!(b3.employee_name.as_deref(), Some("Ana Silva"));
        assert_eq!(b3.subject(), "BOC B-3 expires in 3 days");
        assert!(b3.message().contains("held by Ana Silva"));

        let v1 = notifications.iter().find(|n| n.number == "V-1").unwrap();
        assert_eq!(v1.subject(), "VRF V-1 expires in 1 day");
        assert!(v1.message().starts_with("Unassigned"));
    }

    #[test]
    fn test_dispatch_to_collecting_sink() {
        let notifications = expiring(&snapshot(), 30);
        let mut sink: Vec<Notification> = Vec::new();
        let sent = dispatch(&mut sink, &notifications).unwrap();
        assert_eq!(sent, 4);
        assert_eq!(sink, notifications);
    }

    #[test]
    fn test_log_sink_delivers() {
        crate::logging::init_test_logging();
        let mut sink = LogSink::new(Some("security@example.org".to_string()));
        assert_eq!(dispatch(&mut sink, &expiring(&snapshot(), 7)).unwrap(), 3);
    }
}
