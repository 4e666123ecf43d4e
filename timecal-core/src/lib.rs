//! Core library for timecal.
//!
//! This crate holds everything the `timecal` binary does:
//! - `sync`: reconciliation of Toggl time entries into calendar events
//! - `store`: the calendar store capability and its adapters
//! - `toggl`: the time entry source
//! - `summary` and `assistant`: daily/weekly activity reports and debriefs

pub mod assistant;
pub mod config;
pub mod date_range;
pub mod error;
pub mod fingerprint;
pub mod notify;
pub mod osascript;
pub mod store;
pub mod summary;
pub mod sync;
pub mod time_entry;
pub mod toggl;

pub use error::{TimecalError, TimecalResult};
pub use fingerprint::EventFingerprint;
pub use time_entry::{TimeEntry, TimeEntrySource};
