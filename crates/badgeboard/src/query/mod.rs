//! Read-side queries over a refreshed snapshot.

pub mod alerts;
pub mod filter;
pub mod schedule;

pub use alerts::{dispatch, expiring, LogSink, Notification, NotificationSink};
pub use filter::{
    EmployeeFilter, ExpiryRange, PobFilter, SortConfig, SortDirection, SortKey, BLOOD_TYPES,
};
pub use schedule::{AirportSchedule, Movement, ScheduleEntry};
