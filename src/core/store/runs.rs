//! Import run history

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{ImportRun, StoreError, TrackerStore};

impl TrackerStore {
    pub fn record_import_run(&mut self, run: &ImportRun) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO import_runs (run_id, project_id, file_name, file_sha256, total, succeeded, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.run_id,
                run.project_id,
                run.file_name,
                run.file_sha256,
                run.total as i64,
                run.succeeded as i64,
                run.imported_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Runs for a project, most recent first
    pub fn import_runs(&self, project_id: i64) -> Result<Vec<ImportRun>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, project_id, file_name, file_sha256, total, succeeded, imported_at
             FROM import_runs WHERE project_id = ?1
             ORDER BY imported_at DESC, run_id DESC",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            let imported_at: String = row.get(6)?;
            Ok(ImportRun {
                run_id: row.get(0)?,
                project_id: row.get(1)?,
                file_name: row.get(2)?,
                file_sha256: row.get(3)?,
                total: row.get::<_, i64>(4)? as usize,
                succeeded: row.get::<_, i64>(5)? as usize,
                imported_at: DateTime::parse_from_rfc3339(&imported_at)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}
