//! Where imported issues are written

use crate::core::store::{IssueId, NewIssue, SaveError, TrackerStore};

/// Write side of an import
pub trait IssueSink {
    /// Validate and persist one issue
    fn insert(&mut self, issue: &NewIssue) -> Result<IssueId, SaveError>;

    /// Overwrite the creation timestamp of an issue `insert` returned.
    /// The first write always stamps the current time, so an explicit
    /// creation time needs this second write.
    fn restamp_created(&mut self, id: IssueId, created: &str) -> Result<(), SaveError>;
}

impl IssueSink for TrackerStore {
    fn insert(&mut self, issue: &NewIssue) -> Result<IssueId, SaveError> {
        self.insert_issue(issue)
    }

    fn restamp_created(&mut self, id: IssueId, created: &str) -> Result<(), SaveError> {
        TrackerStore::restamp_created(self, id, created)
    }
}

/// Runs the store's validation without writing. Ids are placeholders
/// counting up from 1.
pub struct DryRunSink<'a> {
    store: &'a TrackerStore,
    last_id: IssueId,
}

impl<'a> DryRunSink<'a> {
    pub fn new(store: &'a TrackerStore) -> Self {
        Self { store, last_id: 0 }
    }
}

impl IssueSink for DryRunSink<'_> {
    fn insert(&mut self, issue: &NewIssue) -> Result<IssueId, SaveError> {
        self.store.check_issue(issue)?;
        self.last_id += 1;
        Ok(self.last_id)
    }

    fn restamp_created(&mut self, _id: IssueId, created: &str) -> Result<(), SaveError> {
        self.store.check_created(created).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_validates_without_writing() {
        let mut store = TrackerStore::open_in_memory().unwrap();
        let project = store.add_project("web", "Website").unwrap();
        let alice = store.add_user("alice", "Alice").unwrap();
        let bug = store.add_tracker("Bug", &["web".to_string()]).unwrap();
        store.add_status("New", true).unwrap();
        store.add_priority("Normal", true).unwrap();

        let issue = NewIssue {
            project_id: project.id,
            author_id: Some(alice.id),
            tracker_id: Some(bug.id),
            subject: "Fix crash".to_string(),
            ..Default::default()
        };

        let mut sink = DryRunSink::new(&store);
        assert_eq!(sink.insert(&issue).unwrap(), 1);
        assert_eq!(sink.insert(&issue).unwrap(), 2);
        assert!(sink.restamp_created(1, "2024-01-01").is_ok());
        assert!(matches!(
            sink.restamp_created(1, "never"),
            Err(SaveError::Invalid(_))
        ));

        let blank = NewIssue {
            subject: String::new(),
            ..issue
        };
        assert!(matches!(sink.insert(&blank), Err(SaveError::Invalid(_))));

        assert!(store.project_issues(project.id).unwrap().is_empty());
    }
}
