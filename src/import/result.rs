//! Outcome of an import run

use serde::Serialize;
use std::collections::HashSet;

use crate::core::store::IssueId;

/// One row-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineError {
    /// 1-based data row number (the header row is not counted)
    pub line: usize,
    pub message: String,
    /// Set when the issue was written but a follow-up write failed, so a
    /// record exists even though the row is reported as failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<IssueId>,
}

/// Counts and per-line errors of an import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub run_id: String,
    /// Data rows attempted
    pub total: usize,
    /// Rows persisted without any error
    pub succeeded: usize,
    /// Ids of the issues counted in `succeeded`
    pub created: Vec<IssueId>,
    pub errors: Vec<LineError>,
}

impl ImportResult {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.succeeded == self.total
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    pub(crate) fn push_error(&mut self, line: usize, message: impl Into<String>) {
        self.errors.push(LineError {
            line,
            message: message.into(),
            persisted: None,
        });
    }

    /// Rows that left a record behind without being counted as created
    pub fn orphaned(&self) -> impl Iterator<Item = &LineError> {
        self.errors.iter().filter(|e| e.persisted.is_some())
    }

    /// Errors in line order with repeated messages collapsed onto their
    /// first (lowest) line. Rows that left an issue behind are never
    /// collapsed, each one names a different saved issue.
    pub fn report(&self) -> Vec<&LineError> {
        let mut ordered: Vec<&LineError> = self.errors.iter().collect();
        ordered.sort_by_key(|e| e.line);

        let mut seen = HashSet::new();
        ordered.retain(|e| e.persisted.is_some() || seen.insert(e.message.as_str()));
        ordered
    }

    /// Confirmation or partial-failure headline
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!(
                "CSV Import Successful, {} new issues have been created",
                self.succeeded
            )
        } else {
            format!(
                "{} of {} issues were created",
                self.succeeded, self.total
            )
        }
    }
}
