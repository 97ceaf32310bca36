//! Core module - workspace, configuration and the tracker database

pub mod config;
pub mod store;
pub mod workspace;

pub use config::Config;
pub use store::{StoreError, TrackerStore};
pub use workspace::{Workspace, WorkspaceError};
