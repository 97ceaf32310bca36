//! Read-only name lookups the importer resolves cells against

use crate::core::store::{
    CustomFieldRecord, EnumerationRecord, NamedRecord, ProjectRecord, StoreError, TrackerStore,
    UserRecord,
};

/// Name resolution for one project. Every lookup is exact and
/// case-sensitive except `custom_field`, which ignores case.
pub trait Catalog {
    /// Project the issues are imported into
    fn project(&self) -> &ProjectRecord;

    /// A project member by login
    fn member(&self, login: &str) -> Option<&UserRecord>;

    /// A tracker enabled for the project
    fn tracker(&self, name: &str) -> Option<&NamedRecord>;

    fn status(&self, name: &str) -> Option<&EnumerationRecord>;

    fn default_status(&self) -> Option<&EnumerationRecord>;

    fn priority(&self, name: &str) -> Option<&EnumerationRecord>;

    fn default_priority(&self) -> Option<&EnumerationRecord>;

    /// A version belonging to the project
    fn version(&self, name: &str) -> Option<&NamedRecord>;

    /// A custom field by name, compared case-insensitively; not filtered by project
    fn custom_field(&self, name: &str) -> Option<&CustomFieldRecord>;
}

/// Catalog snapshot of a single project, loaded once per import
#[derive(Debug, Clone)]
pub struct ProjectCatalog {
    pub project: ProjectRecord,
    pub members: Vec<UserRecord>,
    pub trackers: Vec<NamedRecord>,
    pub statuses: Vec<EnumerationRecord>,
    pub priorities: Vec<EnumerationRecord>,
    pub versions: Vec<NamedRecord>,
    pub custom_fields: Vec<CustomFieldRecord>,
}

impl ProjectCatalog {
    /// Snapshot everything the importer may look up for `project`
    pub fn load(store: &TrackerStore, project: ProjectRecord) -> Result<Self, StoreError> {
        Ok(Self {
            members: store.project_members(project.id)?,
            trackers: store.project_trackers(project.id)?,
            statuses: store.statuses()?,
            priorities: store.priorities()?,
            versions: store.project_versions(project.id)?,
            custom_fields: store.custom_fields()?,
            project,
        })
    }
}

impl Catalog for ProjectCatalog {
    fn project(&self) -> &ProjectRecord {
        &self.project
    }

    fn member(&self, login: &str) -> Option<&UserRecord> {
        self.members.iter().find(|u| u.login == login)
    }

    fn tracker(&self, name: &str) -> Option<&NamedRecord> {
        self.trackers.iter().find(|t| t.name == name)
    }

    fn status(&self, name: &str) -> Option<&EnumerationRecord> {
        self.statuses.iter().find(|s| s.name == name)
    }

    fn default_status(&self) -> Option<&EnumerationRecord> {
        self.statuses.iter().find(|s| s.is_default)
    }

    fn priority(&self, name: &str) -> Option<&EnumerationRecord> {
        self.priorities.iter().find(|p| p.name == name)
    }

    fn default_priority(&self) -> Option<&EnumerationRecord> {
        self.priorities.iter().find(|p| p.is_default)
    }

    fn version(&self, name: &str) -> Option<&NamedRecord> {
        self.versions.iter().find(|v| v.name == name)
    }

    fn custom_field(&self, name: &str) -> Option<&CustomFieldRecord> {
        let name = name.to_lowercase();
        self.custom_fields
            .iter()
            .find(|f| f.name.to_lowercase() == name)
    }
}
