//! Recognized CSV columns and their header labels

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Standard issue fields a CSV column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardField {
    Author,
    Subject,
    Tracker,
    Description,
    Assignee,
    EstimatedHours,
    Status,
    StartDate,
    DueDate,
    Priority,
    Created,
    Version,
}

impl StandardField {
    /// Fields every import file has to provide a column for
    pub const REQUIRED: [StandardField; 3] = [
        StandardField::Author,
        StandardField::Subject,
        StandardField::Tracker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StandardField::Author => "author",
            StandardField::Subject => "subject",
            StandardField::Tracker => "tracker",
            StandardField::Description => "description",
            StandardField::Assignee => "assignee",
            StandardField::EstimatedHours => "estimated_hours",
            StandardField::Status => "status",
            StandardField::StartDate => "start_date",
            StandardField::DueDate => "due_date",
            StandardField::Priority => "priority",
            StandardField::Created => "created",
            StandardField::Version => "version",
        }
    }

    /// All fields, required ones first
    pub fn all() -> &'static [StandardField] {
        &[
            StandardField::Author,
            StandardField::Subject,
            StandardField::Tracker,
            StandardField::Description,
            StandardField::Assignee,
            StandardField::EstimatedHours,
            StandardField::Status,
            StandardField::StartDate,
            StandardField::DueDate,
            StandardField::Priority,
            StandardField::Created,
            StandardField::Version,
        ]
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Label used when no override is configured: the name with its first
    /// underscore turned into a space ("estimated hours")
    pub fn default_label(&self) -> String {
        self.as_str().replacen('_', " ", 1)
    }
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(' ', "_");
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| format!("Unknown issue field: {}", s))
    }
}

/// Which set of columns the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Author, subject, tracker, description, assignee, estimated hours,
    /// status and dates only
    Basic,
    /// Adds priority, version and creation-time columns
    #[default]
    Rich,
}

impl Dialect {
    /// Whether a column for `field` is recognized in this dialect
    pub fn recognizes(&self, field: StandardField) -> bool {
        match self {
            Dialect::Rich => true,
            Dialect::Basic => !matches!(
                field,
                StandardField::Priority | StandardField::Version | StandardField::Created
            ),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Dialect::Basic),
            "rich" => Ok(Dialect::Rich),
            _ => Err(format!("Unknown dialect: {}", s)),
        }
    }
}

/// Immutable table of recognized fields and the header label each one
/// matches. Labels are stored normalized (trimmed, lowercase).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLabels {
    labels: Vec<(StandardField, String)>,
}

impl FieldLabels {
    /// Default labels for every field the dialect recognizes
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            labels: StandardField::all()
                .iter()
                .filter(|f| dialect.recognizes(**f))
                .map(|f| (*f, f.default_label()))
                .collect(),
        }
    }

    /// Replace labels of recognized fields; fields the table does not
    /// contain are ignored
    pub fn with_overrides(mut self, overrides: &HashMap<StandardField, String>) -> Self {
        for (field, label) in self.labels.iter_mut() {
            if let Some(custom) = overrides.get(field) {
                *label = normalize_label(custom);
            }
        }
        self
    }

    /// Recognized fields in table order
    pub fn fields(&self) -> impl Iterator<Item = StandardField> + '_ {
        self.labels.iter().map(|(f, _)| *f)
    }

    pub fn label(&self, field: StandardField) -> Option<&str> {
        self.labels
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, l)| l.as_str())
    }

    /// Whether a normalized header label belongs to a recognized field
    pub fn is_standard_label(&self, label: &str) -> bool {
        self.labels.iter().any(|(_, l)| l == label)
    }
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self::for_dialect(Dialect::default())
    }
}

/// Header labels compare trimmed and case-insensitively
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// First character upper case, the rest lower case ("estimated hours" ->
/// "Estimated hours", "TEAM" -> "Team")
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
