//! CLI command implementations

pub mod catalog;
pub mod completions;
pub mod history;
pub mod import;
pub mod init;
pub mod issues;
