//! Derivation rules: expiry day counts, statuses, presence and the
//! employee/credential consistency rules.
//!
//! Everything here is pure and takes `now` explicitly; persistence lives in
//! [`crate::registry`].

pub mod consistency;
pub mod expiry;
pub mod presence;
pub mod status;

pub use consistency::{
    refresh, refreshed, resync_employee, select_credential, set_badge, sync_credential,
    CredentialState, SyncOutcome,
};
pub use expiry::{days_between, days_until, parse_date, parse_instant, ExpiryBand};
pub use presence::{PobSummary, Presence};
pub use status::{candidates, derive_status, is_candidate, refresh_credentials};
