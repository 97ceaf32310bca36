//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::workspace::Workspace;
use crate::import::{Dialect, ImportOptions, StandardField};

/// Trackport configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file; relative paths are resolved against the workspace root
    pub database: Option<PathBuf>,

    /// Column set understood by the importer
    pub dialect: Option<Dialect>,

    /// Reject unparseable estimated hours instead of reading them as zero
    pub strict_hours: Option<bool>,

    /// Header label overrides
    pub labels: HashMap<StandardField, String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/trackport/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.trackport/config.yaml)
        if let Some(workspace) = workspace {
            if let Some(local) = Self::read_file(&workspace.config_dir().join("config.yaml")) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Ok(database) = std::env::var("TRACKPORT_DB") {
            config.database = Some(PathBuf::from(database));
        }
        if let Ok(dialect) = std::env::var("TRACKPORT_DIALECT") {
            match dialect.parse() {
                Ok(dialect) => config.dialect = Some(dialect),
                Err(e) => tracing::warn!("ignoring TRACKPORT_DIALECT: {}", e),
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable config: {}", e);
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "trackport")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.dialect.is_some() {
            self.dialect = other.dialect;
        }
        if other.strict_hours.is_some() {
            self.strict_hours = other.strict_hours;
        }
        self.labels.extend(other.labels);
    }

    /// Database location for a workspace
    pub fn database_path(&self, workspace: &Workspace) -> PathBuf {
        match &self.database {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => workspace.root().join(path),
            None => workspace.database_path(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    /// Importer settings derived from this configuration
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::new(self.dialect())
            .with_label_overrides(&self.labels)
            .with_strict_hours(self.strict_hours.unwrap_or(false))
    }
}
