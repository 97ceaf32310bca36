//! Trackport: bulk issue import for project trackers
//!
//! Issues are read from CSV files, checked row by row against the target
//! project's catalog (members, trackers, statuses, priorities, versions
//! and custom fields) and saved to a SQLite tracker database. Rows that
//! fail are reported by line; the rest are created.

pub mod cli;
pub mod core;
pub mod import;
