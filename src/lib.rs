//! tsi: timesheet importer
//!
//! Converts CSV/JSON exports of time trackers and complete legacy
//! installations into the records of a time-tracking store.

pub mod cli;
pub mod core;
pub mod entities;
pub mod import;
pub mod legacy;
