//! Building and saving one issue per data row
//!
//! Every field of a row is resolved before deciding whether to save, so a
//! row reports all of its problems at once instead of the first one.

use csv::StringRecord;
use tracing::{debug, warn};

use crate::core::store::{IssueId, NewIssue, SaveError, StoreError};

use super::catalog::Catalog;
use super::fields::{Dialect, StandardField};
use super::headers::ResolvedHeaders;
use super::sink::IssueSink;
use super::ImportOptions;

/// What happened to a single row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Saved (and re-stamped, if requested) without errors
    Created(IssueId),
    /// Not saved; one message per problem
    Rejected(Vec<String>),
    /// Saved, but overriding the creation time failed afterwards
    Orphaned { id: IssueId, message: String },
}

/// Resolves rows against a catalog for one import
pub struct RowBuilder<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    headers: &'a ResolvedHeaders,
    options: &'a ImportOptions,
}

impl<'a, C: Catalog + ?Sized> RowBuilder<'a, C> {
    pub fn new(catalog: &'a C, headers: &'a ResolvedHeaders, options: &'a ImportOptions) -> Self {
        Self {
            catalog,
            headers,
            options,
        }
    }

    /// Resolve a row into a candidate issue plus an optional creation-time
    /// override, or the list of problems found
    pub fn build(&self, record: &StringRecord) -> Result<(NewIssue, Option<String>), Vec<String>> {
        let mut errors = Vec::new();
        let mut issue = NewIssue {
            project_id: self.catalog.project().id,
            ..Default::default()
        };

        issue.subject = self.cell(record, StandardField::Subject).unwrap_or("").to_string();
        issue.description = self
            .cell(record, StandardField::Description)
            .map(str::to_string);

        let author = self.cell(record, StandardField::Author).unwrap_or("");
        match self.catalog.member(author) {
            Some(user) => issue.author_id = Some(user.id),
            None => errors.push(not_a_member(author)),
        }

        let tracker = self.cell(record, StandardField::Tracker).unwrap_or("");
        match self.catalog.tracker(tracker) {
            Some(t) => issue.tracker_id = Some(t.id),
            None => errors.push(format!(
                "Tracker '{}' is invalid or not assigned to this project",
                tracker
            )),
        }

        if let Some(assignee) = self.cell(record, StandardField::Assignee) {
            if !is_blank(assignee) {
                match self.catalog.member(assignee) {
                    Some(user) => issue.assignee_id = Some(user.id),
                    None => errors.push(not_a_member(assignee)),
                }
            }
        }

        if let Some(hours) = self.cell(record, StandardField::EstimatedHours) {
            if !self.options.strict_hours {
                issue.estimated_hours = Some(lenient_float(hours));
            } else if !is_blank(hours) {
                match hours.trim().parse::<f64>() {
                    Ok(h) => issue.estimated_hours = Some(h),
                    Err(_) => errors.push(format!("Estimated hours '{}' is invalid", hours)),
                }
            }
        }

        issue.start_date = self
            .cell(record, StandardField::StartDate)
            .map(str::to_string);
        issue.due_date = self
            .cell(record, StandardField::DueDate)
            .map(str::to_string);

        if let Some(priority) = self.cell(record, StandardField::Priority) {
            match self
                .catalog
                .priority(priority)
                .or_else(|| self.catalog.default_priority())
            {
                Some(p) => issue.priority_id = Some(p.id),
                None => errors.push(format!(
                    "Priority '{}' is invalid and no default is set",
                    priority
                )),
            }
        }

        if let Some(status) = self.cell(record, StandardField::Status) {
            match self
                .catalog
                .status(status)
                .or_else(|| self.catalog.default_status())
            {
                Some(s) => issue.status_id = Some(s.id),
                None => errors.push(match self.options.dialect {
                    Dialect::Basic => format!("Status '{}' is invalid", status),
                    Dialect::Rich => {
                        format!("Status '{}' is invalid and no default is set", status)
                    }
                }),
            }
        }

        if let Some(version) = self.cell(record, StandardField::Version) {
            if !is_blank(version) {
                match self.catalog.version(version) {
                    Some(v) => issue.fixed_version_id = Some(v.id),
                    None => errors.push(format!("Version '{}' is invalid", version)),
                }
            }
        }

        issue.custom_values = self
            .headers
            .custom_columns()
            .iter()
            .map(|c| (c.field_id, cell_at(record, c.column)))
            .filter(|(_, value)| !is_blank(value))
            .map(|(id, value)| (id, value.to_string()))
            .collect();

        let created = self
            .cell(record, StandardField::Created)
            .filter(|c| !is_blank(c))
            .map(str::to_string);

        if errors.is_empty() {
            Ok((issue, created))
        } else {
            Err(errors)
        }
    }

    /// Build one row and, if it resolved cleanly, save it. Only a store
    /// failure is returned as an error; everything else is a row outcome.
    pub fn import<S: IssueSink + ?Sized>(
        &self,
        sink: &mut S,
        record: &StringRecord,
        line: usize,
    ) -> Result<RowOutcome, StoreError> {
        let (issue, created) = match self.build(record) {
            Ok(built) => built,
            Err(errors) => {
                warn!(line, errors = errors.len(), "row rejected");
                return Ok(RowOutcome::Rejected(errors));
            }
        };

        let id = match sink.insert(&issue) {
            Ok(id) => id,
            Err(SaveError::Invalid(messages)) => {
                warn!(line, "row failed store validation");
                return Ok(RowOutcome::Rejected(vec![save_message(&messages)]));
            }
            Err(SaveError::Store(e)) => return Err(e),
        };
        debug!(line, id, "issue saved");

        let Some(created) = created else {
            return Ok(RowOutcome::Created(id));
        };

        match sink.restamp_created(id, &created) {
            Ok(()) => Ok(RowOutcome::Created(id)),
            Err(SaveError::Invalid(messages)) => {
                warn!(line, id, "issue saved but creation time was rejected");
                Ok(RowOutcome::Orphaned {
                    id,
                    message: save_message(&messages),
                })
            }
            Err(SaveError::Store(e)) => Err(e),
        }
    }

    /// Cell of a standard field, `None` when the file has no such column.
    /// Short rows read as empty cells.
    fn cell<'r>(&self, record: &'r StringRecord, field: StandardField) -> Option<&'r str> {
        self.headers
            .column(field)
            .map(|column| cell_at(record, column))
    }
}

fn cell_at(record: &StringRecord, column: usize) -> &str {
    record.get(column).unwrap_or("")
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn not_a_member(login: &str) -> String {
    format!("User '{}' is not a member of the project", login)
}

/// Join store messages into one line, reworded for people filling in
/// spreadsheets
pub fn save_message(messages: &[String]) -> String {
    let mut unique: Vec<&String> = Vec::new();
    for m in messages {
        if !unique.contains(&m) {
            unique.push(m);
        }
    }
    unique
        .iter()
        .map(|m| m.replacen("is not included in the list", "has an invalid value", 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse the longest numeric prefix ("3.5h" -> 3.5); no digits -> 0.0
pub fn lenient_float(text: &str) -> f64 {
    let s = text.trim_start().as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if end < s.len() && (s[end] == b'+' || s[end] == b'-') {
        end += 1;
    }
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end + 1 < s.len() && s[end] == b'.' && s[end + 1].is_ascii_digit() {
        end += 1;
        while end < s.len() && s[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < s.len() && (s[end] == b'e' || s[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < s.len() && (s[exp_end] == b'+' || s[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_start = exp_end;
        while exp_end < s.len() && s[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    std::str::from_utf8(&s[..end])
        .ok()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0.0)
}
