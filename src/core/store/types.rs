//! Store type definitions
//!
//! Rows read from the tracker database and records written to it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database id of a persisted issue
pub type IssueId = i64;

// =========================================================================
// Catalog Rows
// =========================================================================

/// A tracker project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: i64,
    /// Short identifier used on the command line (e.g. "web")
    pub identifier: String,
    pub name: String,
}

/// A user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub login: String,
    pub name: String,
}

/// Named catalog entry (tracker, version)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRecord {
    pub id: i64,
    pub name: String,
}

/// Status or priority; at most one entry per catalog is the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationRecord {
    pub id: i64,
    pub name: String,
    pub is_default: bool,
}

/// Value format of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    #[default]
    String,
    Int,
    Float,
    Date,
    Bool,
    List,
}

impl FieldFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldFormat::String => "string",
            FieldFormat::Int => "int",
            FieldFormat::Float => "float",
            FieldFormat::Date => "date",
            FieldFormat::Bool => "bool",
            FieldFormat::List => "list",
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(FieldFormat::String),
            "int" => Ok(FieldFormat::Int),
            "float" => Ok(FieldFormat::Float),
            "date" => Ok(FieldFormat::Date),
            "bool" => Ok(FieldFormat::Bool),
            "list" => Ok(FieldFormat::List),
            _ => Err(format!("Unknown field format: {}", s)),
        }
    }
}

/// An issue custom field definition with its project scoping
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFieldRecord {
    pub id: i64,
    pub name: String,
    pub format: FieldFormat,
    /// Allowed values for list fields
    pub possible_values: Vec<String>,
    pub is_required: bool,
    /// Applies to every project regardless of `project_ids`
    pub is_for_all: bool,
    /// Projects the field has been explicitly enabled for
    pub project_ids: Vec<i64>,
}

impl CustomFieldRecord {
    /// Whether the field may be used on issues of the given project
    pub fn is_enabled_for(&self, project_id: i64) -> bool {
        self.is_for_all || self.project_ids.contains(&project_id)
    }
}

/// Definition of a custom field to create
#[derive(Debug, Clone, Default)]
pub struct NewCustomField {
    pub name: String,
    pub format: FieldFormat,
    pub possible_values: Vec<String>,
    pub is_required: bool,
    pub is_for_all: bool,
    /// Project identifiers to enable the field for
    pub projects: Vec<String>,
}

// =========================================================================
// Issues
// =========================================================================

/// Candidate issue handed to the store for validation and insertion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub project_id: i64,
    pub author_id: Option<i64>,
    pub subject: String,
    pub tracker_id: Option<i64>,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
    pub estimated_hours: Option<f64>,
    /// Raw date text, checked by the store
    pub start_date: Option<String>,
    /// Raw date text, checked by the store
    pub due_date: Option<String>,
    pub priority_id: Option<i64>,
    pub status_id: Option<i64>,
    pub fixed_version_id: Option<i64>,
    /// (custom field id, raw value), blank values already removed
    pub custom_values: Vec<(i64, String)>,
}

/// A persisted issue joined with its display names
#[derive(Debug, Clone, Serialize)]
pub struct IssueRow {
    pub id: IssueId,
    pub tracker: String,
    pub status: String,
    pub priority: String,
    pub subject: String,
    pub author: String,
    pub assignee: Option<String>,
    pub version: Option<String>,
    pub created_on: DateTime<Utc>,
}

/// A recorded import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportRun {
    pub run_id: String,
    pub project_id: i64,
    pub file_name: String,
    pub file_sha256: String,
    pub total: usize,
    pub succeeded: usize,
    pub imported_at: DateTime<Utc>,
}
