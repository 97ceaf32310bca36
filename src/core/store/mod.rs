//! SQLite-backed tracker store
//!
//! Holds the catalogs an import resolves against (projects, members,
//! trackers, statuses, priorities, versions, custom fields) and the issues
//! it creates. The store validates every issue before inserting it, the way
//! a web application's model layer would, and reports failures as
//! human-readable "full messages".

mod catalog;
mod issues;
mod runs;
mod schema;
mod types;

pub use issues::{CheckedIssue, SaveError, SUBJECT_MAX_LENGTH};
pub use types::*;

use std::fs;
use std::path::Path;

use rusqlite::{Connection, ErrorCode, OptionalExtension};
use thiserror::Error;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// The tracker database
pub struct TrackerStore {
    conn: Connection,
}

impl TrackerStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Open a throwaway store (tests, dry runs against scratch data)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut store = Self { conn };

        match store.schema_version()? {
            None => store.init_schema()?,
            Some(found) if found != SCHEMA_VERSION => {
                return Err(StoreError::SchemaMismatch {
                    found,
                    expected: SCHEMA_VERSION,
                })
            }
            Some(_) => {}
        }

        Ok(store)
    }

    /// Version recorded in the database, `None` for a fresh file
    fn schema_version(&self) -> Result<Option<i32>, StoreError> {
        let has_table: bool = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get::<_, i64>(0).map(|n| n > 0),
        )?;
        if !has_table {
            return Ok(None);
        }

        Ok(self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?)
    }
}

/// Errors raised by the tracker store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {found} does not match expected version {expected}")]
    SchemaMismatch { found: i32, expected: i32 },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Turn a UNIQUE constraint failure into `AlreadyExists`
fn map_unique(err: rusqlite::Error, kind: &'static str, name: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::AlreadyExists {
                kind,
                name: name.to_string(),
            }
        }
        other => StoreError::Sqlite(other),
    }
}
