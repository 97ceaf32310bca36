//! Bulk issue import from CSV
//!
//! The first CSV record is the header row. Headers are mapped to issue
//! fields and checked once; any header problem aborts the whole import
//! before a single row is touched. Data rows are then resolved and saved
//! one at a time, in file order. A bad row is recorded against its line
//! number and the import moves on, so a run can partially succeed. Rows
//! saved earlier are never rolled back.

mod catalog;
mod fields;
mod headers;
mod result;
mod row;
mod sink;

pub use catalog::{Catalog, ProjectCatalog};
pub use fields::{capitalize, normalize_label, Dialect, FieldLabels, StandardField};
pub use headers::{CustomColumn, HeaderMapping, ResolvedHeaders};
pub use result::{ImportResult, LineError};
pub use row::{lenient_float, save_message, RowBuilder, RowOutcome};
pub use sink::{DryRunSink, IssueSink};

use csv::{ReaderBuilder, StringRecord};
use miette::Diagnostic;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, info, info_span};
use ulid::Ulid;

use crate::core::store::StoreError;

/// Errors that abort an import as a whole
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("Please select a CSV file.")]
    #[diagnostic(
        code(trackport::import::no_file),
        help("pass the CSV file after the project identifier")
    )]
    NoFile,

    #[error("CSV is empty.")]
    #[diagnostic(code(trackport::import::empty))]
    Empty,

    #[error("CSV could not be parsed: {0}")]
    #[diagnostic(code(trackport::import::parse))]
    Parse(#[from] csv::Error),

    #[error("Missing required fields: {}", field_list(.0))]
    #[diagnostic(
        code(trackport::import::missing_fields),
        help("the header row needs Author, Subject and Tracker columns")
    )]
    MissingRequiredFields(Vec<StandardField>),

    #[error(
        "These issue custom fields are invalid or not assigned to project: {}",
        label_list(.0)
    )]
    #[diagnostic(
        code(trackport::import::custom_fields),
        help("unknown columns are read as custom fields; rename them or enable the field for this project")
    )]
    InvalidCustomFields(Vec<String>),

    #[error(transparent)]
    #[diagnostic(code(trackport::import::store))]
    Store(#[from] StoreError),

    /// The store failed partway through the rows. Issues saved before the
    /// failure are kept and listed in `result`.
    #[error("Import stopped at line {line}: {source}")]
    #[diagnostic(
        code(trackport::import::aborted),
        help("issues saved before this line were kept")
    )]
    Aborted {
        line: usize,
        result: Box<ImportResult>,
        source: StoreError,
    },
}

fn field_list(fields: &[StandardField]) -> String {
    fields
        .iter()
        .map(|f| capitalize(f.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn label_list(labels: &[String]) -> String {
    labels
        .iter()
        .map(|l| capitalize(l))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Import settings that stay fixed for a whole run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dialect: Dialect,
    /// Header labels, consistent with `dialect`
    pub labels: FieldLabels,
    /// Report unparseable estimated hours instead of reading them as zero
    pub strict_hours: bool,
}

impl ImportOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            labels: FieldLabels::for_dialect(dialect),
            strict_hours: false,
        }
    }

    pub fn with_label_overrides(mut self, overrides: &HashMap<StandardField, String>) -> Self {
        self.labels = self.labels.with_overrides(overrides);
        self
    }

    pub fn with_strict_hours(mut self, strict: bool) -> Self {
        self.strict_hours = strict;
        self
    }
}

/// Parse CSV bytes into records, header row included
pub fn read_table(data: &[u8]) -> Result<Vec<StringRecord>, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(records)
}

/// Import CSV bytes into the catalog's project
pub fn import_csv<C, S>(
    data: &[u8],
    catalog: &C,
    sink: &mut S,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError>
where
    C: Catalog + ?Sized,
    S: IssueSink + ?Sized,
{
    let table = read_table(data)?;
    import_table(&table, catalog, sink, options)
}

/// Import already-parsed records; the first record is the header row
pub fn import_table<C, S>(
    table: &[StringRecord],
    catalog: &C,
    sink: &mut S,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError>
where
    C: Catalog + ?Sized,
    S: IssueSink + ?Sized,
{
    let (header_row, rows) = table.split_first().ok_or(ImportError::Empty)?;

    let run_id = Ulid::new().to_string();
    let span = info_span!("import", run_id = %run_id, project = %catalog.project().identifier);
    let _enter = span.enter();

    let headers = HeaderMapping::from_headers(header_row, &options.labels).resolve(catalog)?;
    debug!(custom_columns = headers.custom_columns().len(), "headers resolved");

    let builder = RowBuilder::new(catalog, &headers, options);
    let mut result = ImportResult::new(run_id);

    for (idx, record) in rows.iter().enumerate() {
        let line = idx + 1;
        result.total += 1;

        let outcome = match builder.import(sink, record, line) {
            Ok(outcome) => outcome,
            Err(source) => {
                error!(line, succeeded = result.succeeded, "import aborted: {}", source);
                result.push_error(line, source.to_string());
                return Err(ImportError::Aborted {
                    line,
                    result: Box::new(result),
                    source,
                });
            }
        };

        match outcome {
            RowOutcome::Created(id) => {
                result.succeeded += 1;
                result.created.push(id);
            }
            RowOutcome::Rejected(messages) => {
                for message in messages {
                    result.push_error(line, message);
                }
            }
            RowOutcome::Orphaned { id, message } => result.errors.push(LineError {
                line,
                message,
                persisted: Some(id),
            }),
        }
    }

    info!(
        total = result.total,
        succeeded = result.succeeded,
        "import finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{
        IssueId, NewCustomField, NewIssue, ProjectRecord, SaveError, TrackerStore,
    };

    fn setup() -> (TrackerStore, ProjectRecord) {
        let mut store = TrackerStore::open_in_memory().unwrap();
        let project = store.add_project("web", "Website").unwrap();
        store.add_project("api", "API").unwrap();
        store.add_user("alice", "Alice").unwrap();
        store.add_user("bob", "Bob").unwrap();
        store.add_member("web", "alice").unwrap();
        store.add_tracker("Bug", &["web".to_string()]).unwrap();
        store.add_status("New", true).unwrap();
        store.add_status("Open", false).unwrap();
        store.add_priority("Normal", true).unwrap();
        (store, project)
    }

    fn run(store: &mut TrackerStore, project: &ProjectRecord, csv: &str) -> Result<ImportResult, ImportError> {
        let catalog = ProjectCatalog::load(store, project.clone()).unwrap();
        import_csv(csv.as_bytes(), &catalog, store, &ImportOptions::default())
    }

    #[test]
    fn test_valid_rows_are_all_created() {
        let (mut store, project) = setup();
        let csv = "Author,Subject,Tracker\nalice,One,Bug\nalice,Two,Bug\nalice,Three,Bug\n";

        let result = run(&mut store, &project, csv).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.succeeded, 3);
        assert!(result.errors.is_empty());
        assert_eq!(store.project_issues(project.id).unwrap().len(), 3);
    }

    #[test]
    fn test_partial_success_end_to_end() {
        let (mut store, project) = setup();
        let csv = "Author,Subject,Tracker,Status\nalice,Fix crash,Bug,\nbob,Fix crash,Bug,Open\n";

        let result = run(&mut store, &project, csv).unwrap();
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.total, 2);
        assert_eq!(
            result.errors,
            vec![LineError {
                line: 2,
                message: "User 'bob' is not a member of the project".to_string(),
                persisted: None,
            }]
        );

        let issues = store.project_issues(project.id).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].status, "New");
    }

    #[test]
    fn test_missing_tracker_column_aborts() {
        let (mut store, project) = setup();
        let csv = "Author,Subject\nalice,One\nalice,Two\n";

        let err = run(&mut store, &project, csv).unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingRequiredFields(ref f) if f == &vec![StandardField::Tracker]
        ));
        assert!(err.to_string().contains("Tracker"));
        assert!(store.project_issues(project.id).unwrap().is_empty());
    }

    #[test]
    fn test_custom_field_of_other_project_aborts() {
        let (mut store, project) = setup();
        store
            .add_custom_field(&NewCustomField {
                name: "Endpoint".to_string(),
                projects: vec!["api".to_string()],
                ..Default::default()
            })
            .unwrap();
        let csv = "Author,Subject,Tracker,Endpoint\nalice,One,Bug,/v1\n";

        let err = run(&mut store, &project, csv).unwrap_err();
        assert!(matches!(err, ImportError::InvalidCustomFields(_)));
        assert!(store.project_issues(project.id).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_messages_collapse_in_report() {
        let (mut store, project) = setup();
        let csv = "Author,Subject,Tracker\nalice,One,Task\nalice,Two,Task\nalice,Three,Bug\n";

        let result = run(&mut store, &project, csv).unwrap();
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.errors.len(), 2);

        let report = result.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].line, 1);
        assert_eq!(
            report[0].message,
            "Tracker 'Task' is invalid or not assigned to this project"
        );
    }

    #[test]
    fn test_every_saved_row_with_bad_created_is_reported() {
        let (mut store, project) = setup();
        let csv = "Author,Subject,Tracker,Created\n\
                   alice,One,Bug,yesterday\n\
                   alice,Two,Bug,yesterday\n\
                   alice,Three,Bug,yesterday\n";

        let result = run(&mut store, &project, csv).unwrap();
        assert_eq!(result.succeeded, 0);
        assert_eq!(result.orphaned().count(), 3);
        assert_eq!(store.project_issues(project.id).unwrap().len(), 3);

        let report: Vec<_> = result.report().iter().map(|e| (e.line, e.persisted)).collect();
        assert_eq!(report, vec![(1, Some(1)), (2, Some(2)), (3, Some(3))]);
    }

    /// Writes through to the store for the first `remaining` inserts, then
    /// fails like a lost database
    struct FailingSink<'a> {
        store: &'a mut TrackerStore,
        remaining: usize,
    }

    impl IssueSink for FailingSink<'_> {
        fn insert(&mut self, issue: &NewIssue) -> Result<IssueId, SaveError> {
            if self.remaining == 0 {
                return Err(SaveError::Store(StoreError::Io("disk I/O error".to_string())));
            }
            self.remaining -= 1;
            self.store.insert_issue(issue)
        }

        fn restamp_created(&mut self, id: IssueId, created: &str) -> Result<(), SaveError> {
            self.store.restamp_created(id, created)
        }
    }

    #[test]
    fn test_store_failure_keeps_partial_result() {
        let (mut store, project) = setup();
        let catalog = ProjectCatalog::load(&store, project.clone()).unwrap();
        let csv = "Author,Subject,Tracker\nalice,One,Bug\nalice,Two,Bug\nalice,Three,Bug\n";

        let mut sink = FailingSink {
            store: &mut store,
            remaining: 1,
        };
        let err = import_csv(csv.as_bytes(), &catalog, &mut sink, &ImportOptions::default())
            .unwrap_err();

        let (line, result) = match err {
            ImportError::Aborted { line, result, .. } => (line, result),
            other => panic!("expected an aborted import, got {:?}", other),
        };
        assert_eq!(line, 2);
        assert_eq!(result.total, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.created.len(), 1);
        assert_eq!(result.errors[0].line, 2);
        assert!(result.errors[0].message.contains("disk I/O error"));

        // Rows saved before the failure stay saved; later rows are never tried
        assert_eq!(store.project_issues(project.id).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (mut store, project) = setup();
        let csv = "Author,Subject,Tracker\n\nalice,One,Bug\n\nbob,Two,Bug\n";

        let result = run(&mut store, &project, csv).unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.succeeded, 1);
        // bob's row is the second data row, blank lines are not counted
        assert_eq!(result.errors[0].line, 2);
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let (mut store, project) = setup();
        assert!(matches!(run(&mut store, &project, ""), Err(ImportError::Empty)));
    }

    #[test]
    fn test_header_only_file_creates_nothing() {
        let (mut store, project) = setup();
        let result = run(&mut store, &project, "Author,Subject,Tracker\n").unwrap();
        assert_eq!(result.total, 0);
        assert!(result.is_success());
    }

    #[test]
    fn test_unparseable_file_is_rejected() {
        let (mut store, project) = setup();
        let bytes = b"Author,Subject,Tracker\nalice,\xff\xfe,Bug\n";
        let catalog = ProjectCatalog::load(&store, project.clone()).unwrap();

        let err = import_csv(bytes, &catalog, &mut store, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
        assert!(store.project_issues(project.id).unwrap().is_empty());
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let (store, project) = setup();
        let catalog = ProjectCatalog::load(&store, project.clone()).unwrap();
        let mut sink = DryRunSink::new(&store);
        let csv = "Author,Subject,Tracker\nalice,One,Bug\nalice,,Bug\n";

        let result = import_csv(csv.as_bytes(), &catalog, &mut sink, &ImportOptions::default()).unwrap();
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.errors[0].message, "Subject cannot be blank");
        assert!(store.project_issues(project.id).unwrap().is_empty());
    }
}
