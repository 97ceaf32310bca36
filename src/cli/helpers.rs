//! Shared helper functions for CLI commands

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::store::TrackerStore;
use crate::core::{Config, Workspace};

/// Everything a command needs to talk to the tracker
pub struct Session {
    pub config: Config,
    pub store: TrackerStore,
}

/// Locate the workspace, load its configuration and open the database
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let workspace = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    }
    .map_err(|e| miette::miette!("{}", e))?;

    let config = Config::load(Some(&workspace));
    let db_path = config.database_path(&workspace);
    tracing::debug!(path = %db_path.display(), "opening tracker database");
    let store = TrackerStore::open(&db_path).map_err(|e| miette::miette!("{}", e))?;

    Ok(Session { config, store })
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Tab-separated writer for `--format tsv`; cells holding tabs, quotes
/// or newlines are quoted
pub fn tsv_writer<W: std::io::Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b'\t').from_writer(out)
}
