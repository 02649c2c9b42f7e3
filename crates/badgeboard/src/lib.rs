//! `badgeboard` - Personnel, credential and presence tracking for a site
//! security department
//!
//! This library keeps employees, BOC (badge/clearance) credentials and VRF
//! (visitor/vehicle) records consistent with each other, derives expiry day
//! counts, statuses and presence on base, and moves records in and out
//! through JSON backups and CSV spreadsheets.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod attachment;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod interchange;
pub mod logging;
pub mod model;
pub mod query;
pub mod registry;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use registry::{ImportReport, Registry};
pub use storage::{Storage, StorageStats};
