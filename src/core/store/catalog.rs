//! Catalog maintenance and lookups
//!
//! Projects, users, memberships, trackers, statuses, priorities, versions
//! and custom fields. Lookups return whole catalogs; the importer snapshots
//! them once per run and resolves names in memory.

use rusqlite::{params, OptionalExtension};

use super::{
    map_unique, CustomFieldRecord, EnumerationRecord, FieldFormat, NamedRecord, NewCustomField,
    ProjectRecord, StoreError, TrackerStore, UserRecord,
};

impl TrackerStore {
    // =====================================================================
    // Projects & Users
    // =====================================================================

    pub fn add_project(&mut self, identifier: &str, name: &str) -> Result<ProjectRecord, StoreError> {
        self.conn
            .execute(
                "INSERT INTO projects (identifier, name) VALUES (?1, ?2)",
                params![identifier, name],
            )
            .map_err(|e| map_unique(e, "project", identifier))?;

        Ok(ProjectRecord {
            id: self.conn.last_insert_rowid(),
            identifier: identifier.to_string(),
            name: name.to_string(),
        })
    }

    pub fn project_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<ProjectRecord>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, identifier, name FROM projects WHERE identifier = ?1",
                params![identifier],
                |row| {
                    Ok(ProjectRecord {
                        id: row.get(0)?,
                        identifier: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// Like `project_by_identifier`, but a missing project is an error
    pub fn require_project(&self, identifier: &str) -> Result<ProjectRecord, StoreError> {
        self.project_by_identifier(identifier)?
            .ok_or_else(|| StoreError::not_found("project", identifier))
    }

    pub fn add_user(&mut self, login: &str, name: &str) -> Result<UserRecord, StoreError> {
        self.conn
            .execute(
                "INSERT INTO users (login, name) VALUES (?1, ?2)",
                params![login, name],
            )
            .map_err(|e| map_unique(e, "user", login))?;

        Ok(UserRecord {
            id: self.conn.last_insert_rowid(),
            login: login.to_string(),
            name: name.to_string(),
        })
    }

    /// Add an existing user to a project
    pub fn add_member(&mut self, project: &str, login: &str) -> Result<(), StoreError> {
        let project = self.require_project(project)?;
        let user_id: i64 = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE login = ?1",
                params![login],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("user", login))?;

        self.conn
            .execute(
                "INSERT INTO members (project_id, user_id) VALUES (?1, ?2)",
                params![project.id, user_id],
            )
            .map_err(|e| map_unique(e, "member", login))?;
        Ok(())
    }

    /// Users with a membership in the project
    pub fn project_members(&self, project_id: i64) -> Result<Vec<UserRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.login, u.name FROM members m
             JOIN users u ON u.id = m.user_id
             WHERE m.project_id = ?1
             ORDER BY u.id",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                login: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // =====================================================================
    // Trackers & Versions
    // =====================================================================

    /// Create a tracker and enable it for the given projects
    pub fn add_tracker(&mut self, name: &str, projects: &[String]) -> Result<NamedRecord, StoreError> {
        let project_ids = projects
            .iter()
            .map(|p| self.require_project(p).map(|p| p.id))
            .collect::<Result<Vec<_>, _>>()?;

        let tx = self.conn.transaction()?;
        tx.execute("INSERT INTO trackers (name) VALUES (?1)", params![name])
            .map_err(|e| map_unique(e, "tracker", name))?;
        let id = tx.last_insert_rowid();
        for project_id in project_ids {
            tx.execute(
                "INSERT OR IGNORE INTO project_trackers (project_id, tracker_id) VALUES (?1, ?2)",
                params![project_id, id],
            )?;
        }
        tx.commit()?;

        Ok(NamedRecord {
            id,
            name: name.to_string(),
        })
    }

    /// Trackers enabled for the project
    pub fn project_trackers(&self, project_id: i64) -> Result<Vec<NamedRecord>, StoreError> {
        self.named_rows(
            "SELECT t.id, t.name FROM project_trackers pt
             JOIN trackers t ON t.id = pt.tracker_id
             WHERE pt.project_id = ?1
             ORDER BY t.id",
            project_id,
        )
    }

    pub fn add_version(&mut self, project: &str, name: &str) -> Result<NamedRecord, StoreError> {
        let project = self.require_project(project)?;
        self.conn
            .execute(
                "INSERT INTO versions (project_id, name) VALUES (?1, ?2)",
                params![project.id, name],
            )
            .map_err(|e| map_unique(e, "version", name))?;

        Ok(NamedRecord {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn project_versions(&self, project_id: i64) -> Result<Vec<NamedRecord>, StoreError> {
        self.named_rows(
            "SELECT id, name FROM versions WHERE project_id = ?1 ORDER BY id",
            project_id,
        )
    }

    fn named_rows(&self, sql: &str, project_id: i64) -> Result<Vec<NamedRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(NamedRecord {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // =====================================================================
    // Statuses & Priorities
    // =====================================================================

    pub fn add_status(&mut self, name: &str, is_default: bool) -> Result<EnumerationRecord, StoreError> {
        self.add_enumeration("issue_statuses", "status", name, is_default)
    }

    pub fn add_priority(
        &mut self,
        name: &str,
        is_default: bool,
    ) -> Result<EnumerationRecord, StoreError> {
        self.add_enumeration("issue_priorities", "priority", name, is_default)
    }

    pub fn statuses(&self) -> Result<Vec<EnumerationRecord>, StoreError> {
        self.enumeration_rows("issue_statuses")
    }

    pub fn priorities(&self) -> Result<Vec<EnumerationRecord>, StoreError> {
        self.enumeration_rows("issue_priorities")
    }

    /// Insert into a status/priority table; a new default replaces the old one
    fn add_enumeration(
        &mut self,
        table: &'static str,
        kind: &'static str,
        name: &str,
        is_default: bool,
    ) -> Result<EnumerationRecord, StoreError> {
        let tx = self.conn.transaction()?;
        if is_default {
            tx.execute(&format!("UPDATE {} SET is_default = 0", table), [])?;
        }
        tx.execute(
            &format!("INSERT INTO {} (name, is_default) VALUES (?1, ?2)", table),
            params![name, is_default],
        )
        .map_err(|e| map_unique(e, kind, name))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(EnumerationRecord {
            id,
            name: name.to_string(),
            is_default,
        })
    }

    fn enumeration_rows(&self, table: &'static str) -> Result<Vec<EnumerationRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, is_default FROM {} ORDER BY id",
            table
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(EnumerationRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                is_default: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // =====================================================================
    // Custom Fields
    // =====================================================================

    pub fn add_custom_field(&mut self, field: &NewCustomField) -> Result<CustomFieldRecord, StoreError> {
        let project_ids = field
            .projects
            .iter()
            .map(|p| self.require_project(p).map(|p| p.id))
            .collect::<Result<Vec<_>, _>>()?;

        let possible_values = if field.possible_values.is_empty() {
            None
        } else {
            Some(field.possible_values.join("\n"))
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO custom_fields (name, field_format, possible_values, is_required, is_for_all)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                field.name,
                field.format.as_str(),
                possible_values,
                field.is_required,
                field.is_for_all
            ],
        )
        .map_err(|e| map_unique(e, "custom field", &field.name))?;
        let id = tx.last_insert_rowid();
        for project_id in &project_ids {
            tx.execute(
                "INSERT OR IGNORE INTO custom_field_projects (custom_field_id, project_id) VALUES (?1, ?2)",
                params![id, project_id],
            )?;
        }
        tx.commit()?;

        Ok(CustomFieldRecord {
            id,
            name: field.name.clone(),
            format: field.format,
            possible_values: field.possible_values.clone(),
            is_required: field.is_required,
            is_for_all: field.is_for_all,
            project_ids,
        })
    }

    /// Every custom field with the projects it is enabled for, in id order
    pub fn custom_fields(&self) -> Result<Vec<CustomFieldRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, field_format, possible_values, is_required, is_for_all
             FROM custom_fields ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let format: String = row.get(2)?;
            let possible_values: Option<String> = row.get(3)?;
            Ok(CustomFieldRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                format: format.parse().unwrap_or(FieldFormat::String),
                possible_values: possible_values
                    .map(|v| v.lines().map(str::to_string).collect())
                    .unwrap_or_default(),
                is_required: row.get(4)?,
                is_for_all: row.get(5)?,
                project_ids: Vec::new(),
            })
        })?;
        let mut fields: Vec<CustomFieldRecord> = rows.collect::<Result<_, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT custom_field_id, project_id FROM custom_field_projects")?;
        let links = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for link in links {
            let (field_id, project_id) = link?;
            if let Some(field) = fields.iter_mut().find(|f| f.id == field_id) {
                field.project_ids.push(project_id);
            }
        }

        Ok(fields)
    }
}
