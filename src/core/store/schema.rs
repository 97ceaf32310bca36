//! Database schema initialization

use rusqlite::params;

use super::{StoreError, TrackerStore, SCHEMA_VERSION};

impl TrackerStore {
    /// Initialize database schema
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identifier TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                login TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            );

            -- Project membership; a user only resolves inside projects they belong to
            CREATE TABLE IF NOT EXISTS members (
                project_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY (project_id, user_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS trackers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS project_trackers (
                project_id INTEGER NOT NULL,
                tracker_id INTEGER NOT NULL,
                PRIMARY KEY (project_id, tracker_id),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (tracker_id) REFERENCES trackers(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS issue_statuses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                is_default INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS issue_priorities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                is_default INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                UNIQUE (project_id, name),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS custom_fields (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                field_format TEXT NOT NULL DEFAULT 'string',
                possible_values TEXT,
                is_required INTEGER NOT NULL DEFAULT 0,
                is_for_all INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS custom_field_projects (
                custom_field_id INTEGER NOT NULL,
                project_id INTEGER NOT NULL,
                PRIMARY KEY (custom_field_id, project_id),
                FOREIGN KEY (custom_field_id) REFERENCES custom_fields(id) ON DELETE CASCADE,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS issues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                tracker_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                description TEXT,
                author_id INTEGER NOT NULL,
                assigned_to_id INTEGER,
                status_id INTEGER NOT NULL,
                priority_id INTEGER NOT NULL,
                fixed_version_id INTEGER,
                estimated_hours REAL,
                start_date TEXT,
                due_date TEXT,
                created_on TEXT NOT NULL,
                updated_on TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (tracker_id) REFERENCES trackers(id),
                FOREIGN KEY (author_id) REFERENCES users(id),
                FOREIGN KEY (assigned_to_id) REFERENCES users(id),
                FOREIGN KEY (status_id) REFERENCES issue_statuses(id),
                FOREIGN KEY (priority_id) REFERENCES issue_priorities(id),
                FOREIGN KEY (fixed_version_id) REFERENCES versions(id)
            );
            CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id);

            CREATE TABLE IF NOT EXISTS custom_values (
                issue_id INTEGER NOT NULL,
                custom_field_id INTEGER NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (issue_id, custom_field_id),
                FOREIGN KEY (issue_id) REFERENCES issues(id) ON DELETE CASCADE,
                FOREIGN KEY (custom_field_id) REFERENCES custom_fields(id) ON DELETE CASCADE
            );

            -- One row per completed (non dry-run) import
            CREATE TABLE IF NOT EXISTS import_runs (
                run_id TEXT PRIMARY KEY,
                project_id INTEGER NOT NULL,
                file_name TEXT NOT NULL,
                file_sha256 TEXT NOT NULL,
                total INTEGER NOT NULL,
                succeeded INTEGER NOT NULL,
                imported_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_import_runs_project ON import_runs(project_id);
            "#,
        )?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }
}
