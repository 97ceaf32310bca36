//! Issue validation, insertion and listing

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rusqlite::params;
use thiserror::Error;

use super::{FieldFormat, IssueId, IssueRow, NewIssue, StoreError, TrackerStore};

/// Longest subject the store accepts, in characters
pub const SUBJECT_MAX_LENGTH: usize = 255;

/// Why an issue could not be saved
#[derive(Debug, Error)]
pub enum SaveError {
    /// Field-level validation failures, as full messages ("Subject cannot be blank")
    #[error("{}", .0.join(", "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for SaveError {
    fn from(err: rusqlite::Error) -> Self {
        SaveError::Store(StoreError::Sqlite(err))
    }
}

/// An issue that passed validation, with defaults applied
#[derive(Debug)]
pub struct CheckedIssue {
    pub status_id: i64,
    pub priority_id: i64,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Custom values for fields available to the issue's project
    pub custom_values: Vec<(i64, String)>,
}

impl TrackerStore {
    /// Validate an issue without writing anything
    pub fn check_issue(&self, issue: &NewIssue) -> Result<CheckedIssue, SaveError> {
        let mut errors: Vec<String> = Vec::new();

        if issue.subject.trim().is_empty() {
            errors.push("Subject cannot be blank".to_string());
        } else if issue.subject.chars().count() > SUBJECT_MAX_LENGTH {
            errors.push(format!(
                "Subject is too long (maximum is {} characters)",
                SUBJECT_MAX_LENGTH
            ));
        }
        if issue.tracker_id.is_none() {
            errors.push("Tracker cannot be blank".to_string());
        }
        if issue.author_id.is_none() {
            errors.push("Author cannot be blank".to_string());
        }

        let status_id = issue.status_id.or(self
            .statuses()?
            .into_iter()
            .find(|s| s.is_default)
            .map(|s| s.id));
        if status_id.is_none() {
            errors.push("Status cannot be blank".to_string());
        }

        let priority_id = issue.priority_id.or(self
            .priorities()?
            .into_iter()
            .find(|p| p.is_default)
            .map(|p| p.id));
        if priority_id.is_none() {
            errors.push("Priority cannot be blank".to_string());
        }

        let start_date = parse_optional_date(issue.start_date.as_deref(), "Start date", &mut errors);
        let due_date = parse_optional_date(issue.due_date.as_deref(), "Due date", &mut errors);
        if let (Some(start), Some(due)) = (start_date, due_date) {
            if due < start {
                errors.push("Due date must be greater than start date".to_string());
            }
        }

        if let Some(hours) = issue.estimated_hours {
            if !hours.is_finite() || hours < 0.0 {
                errors.push("Estimated hours is invalid".to_string());
            }
        }

        let mut custom_values = Vec::new();
        for field in self
            .custom_fields()?
            .into_iter()
            .filter(|f| f.is_enabled_for(issue.project_id))
        {
            let value = issue
                .custom_values
                .iter()
                .find(|(id, _)| *id == field.id)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.trim().is_empty());

            let Some(value) = value else {
                if field.is_required {
                    errors.push(format!("{} cannot be blank", field.name));
                }
                continue;
            };

            let problem = match field.format {
                FieldFormat::String => None,
                FieldFormat::Int => value.trim().parse::<i64>().err().map(|_| "is not a number"),
                FieldFormat::Float => value.trim().parse::<f64>().err().map(|_| "is not a number"),
                FieldFormat::Date => parse_date(value).is_none().then_some("is not a valid date"),
                FieldFormat::Bool => {
                    (!matches!(value, "0" | "1")).then_some("is not included in the list")
                }
                FieldFormat::List => (!field.possible_values.iter().any(|v| v == value))
                    .then_some("is not included in the list"),
            };

            match problem {
                Some(problem) => errors.push(format!("{} {}", field.name, problem)),
                None => custom_values.push((field.id, value.to_string())),
            }
        }

        match (status_id, priority_id) {
            (Some(status_id), Some(priority_id)) if errors.is_empty() => Ok(CheckedIssue {
                status_id,
                priority_id,
                start_date,
                due_date,
                custom_values,
            }),
            _ => {
                dedup_in_order(&mut errors);
                Err(SaveError::Invalid(errors))
            }
        }
    }

    /// Validate and insert an issue; `created_on` is stamped with the current time
    pub fn insert_issue(&mut self, issue: &NewIssue) -> Result<IssueId, SaveError> {
        let checked = self.check_issue(issue)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO issues (
                project_id, tracker_id, subject, description, author_id, assigned_to_id,
                status_id, priority_id, fixed_version_id, estimated_hours,
                start_date, due_date, created_on, updated_on
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                issue.project_id,
                issue.tracker_id,
                issue.subject,
                issue.description,
                issue.author_id,
                issue.assignee_id,
                checked.status_id,
                checked.priority_id,
                issue.fixed_version_id,
                issue.estimated_hours,
                checked.start_date.map(|d| d.to_string()),
                checked.due_date.map(|d| d.to_string()),
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        for (field_id, value) in &checked.custom_values {
            tx.execute(
                "INSERT INTO custom_values (issue_id, custom_field_id, value) VALUES (?1, ?2, ?3)",
                params![id, field_id, value],
            )?;
        }
        tx.commit()?;

        Ok(id)
    }

    /// Parse a creation timestamp the way `restamp_created` would
    pub fn check_created(&self, created: &str) -> Result<DateTime<Utc>, SaveError> {
        parse_timestamp(created)
            .ok_or_else(|| SaveError::Invalid(vec!["Created is not a valid date".to_string()]))
    }

    /// Overwrite the creation timestamp of an existing issue
    pub fn restamp_created(&mut self, id: IssueId, created: &str) -> Result<(), SaveError> {
        let created = self.check_created(created)?;

        let updated = self.conn.execute(
            "UPDATE issues SET created_on = ?1 WHERE id = ?2",
            params![created.to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("issue", id.to_string()).into());
        }
        Ok(())
    }

    /// Issues of a project, oldest first
    pub fn project_issues(&self, project_id: i64) -> Result<Vec<IssueRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, t.name, s.name, p.name, i.subject, a.login, u.login, v.name, i.created_on
             FROM issues i
             JOIN trackers t ON t.id = i.tracker_id
             JOIN issue_statuses s ON s.id = i.status_id
             JOIN issue_priorities p ON p.id = i.priority_id
             JOIN users a ON a.id = i.author_id
             LEFT JOIN users u ON u.id = i.assigned_to_id
             LEFT JOIN versions v ON v.id = i.fixed_version_id
             WHERE i.project_id = ?1
             ORDER BY i.id",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            let created: String = row.get(8)?;
            Ok(IssueRow {
                id: row.get(0)?,
                tracker: row.get(1)?,
                status: row.get(2)?,
                priority: row.get(3)?,
                subject: row.get(4)?,
                author: row.get(5)?,
                assignee: row.get(6)?,
                version: row.get(7)?,
                created_on: DateTime::parse_from_rfc3339(&created)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Custom values of an issue as (field name, value)
    pub fn issue_custom_values(&self, id: IssueId) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT f.name, cv.value FROM custom_values cv
             JOIN custom_fields f ON f.id = cv.custom_field_id
             WHERE cv.issue_id = ?1
             ORDER BY f.id",
        )?;
        let rows = stmt.query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Blank text means "unset"; anything else has to be a date
fn parse_optional_date(
    text: Option<&str>,
    attribute: &str,
    errors: &mut Vec<String>,
) -> Option<NaiveDate> {
    let text = text.filter(|t| !t.trim().is_empty())?;
    let date = parse_date(text);
    if date.is_none() {
        errors.push(format!("{} is not a valid date", attribute));
    }
    date
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (UTC) or a bare date
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    parse_date(text)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn dedup_in_order(messages: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    messages.retain(|m| seen.insert(m.clone()));
}
