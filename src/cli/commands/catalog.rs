//! `trackport catalog` command - Maintain the records issues refer to
//!
//! Projects, users and memberships, trackers, statuses, priorities,
//! versions and custom fields all live in the tracker database. Imports
//! only ever read them; this command is how they get there.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{open_session, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::{FieldFormat, NewCustomField};
use crate::import::ProjectCatalog;

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// Create a project
    Project {
        /// Short identifier used on the command line (e.g. "web")
        identifier: String,
        /// Display name
        name: String,
    },

    /// Create a user
    User {
        /// Login name, matched against the Author and Assignee columns
        login: String,
        /// Display name (default: the login)
        #[arg(long)]
        name: Option<String>,
    },

    /// Add a user to a project
    Member {
        /// Project identifier
        project: String,
        /// User login
        login: String,
    },

    /// Create a tracker and enable it for projects
    Tracker {
        name: String,
        /// Project identifiers the tracker is enabled for
        #[arg(long = "project", short = 'p')]
        projects: Vec<String>,
    },

    /// Create an issue status
    Status {
        name: String,
        /// Use as the status of rows that leave it blank
        #[arg(long)]
        default: bool,
    },

    /// Create an issue priority
    Priority {
        name: String,
        /// Use as the priority of rows that leave it blank
        #[arg(long)]
        default: bool,
    },

    /// Create a version of a project
    Version {
        /// Project identifier
        project: String,
        name: String,
    },

    /// Create an issue custom field
    Field {
        name: String,
        /// Value format
        #[arg(long, value_enum, default_value = "string")]
        format: FieldFormat,
        /// Allowed values of a list field (comma separated)
        #[arg(long, value_delimiter = ',')]
        values: Vec<String>,
        /// Reject issues that leave the field blank
        #[arg(long)]
        required: bool,
        /// Enable the field for every project
        #[arg(long)]
        for_all: bool,
        /// Project identifiers the field is enabled for
        #[arg(long = "project", short = 'p')]
        projects: Vec<String>,
    },

    /// Show everything an import into a project can refer to
    Show {
        /// Project identifier
        project: String,
    },
}

pub fn run(cmd: CatalogCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let store = &mut session.store;

    let created = match cmd {
        CatalogCommands::Project { identifier, name } => {
            let project = store.add_project(&identifier, &name).map_err(to_report)?;
            format!("project {}", style(project.identifier).cyan())
        }
        CatalogCommands::User { login, name } => {
            let name = name.unwrap_or_else(|| login.clone());
            let user = store.add_user(&login, &name).map_err(to_report)?;
            format!("user {}", style(user.login).cyan())
        }
        CatalogCommands::Member { project, login } => {
            store.add_member(&project, &login).map_err(to_report)?;
            format!(
                "membership of {} in {}",
                style(login).cyan(),
                style(project).cyan()
            )
        }
        CatalogCommands::Tracker { name, projects } => {
            let tracker = store.add_tracker(&name, &projects).map_err(to_report)?;
            format!("tracker {}", style(tracker.name).cyan())
        }
        CatalogCommands::Status { name, default } => {
            let status = store.add_status(&name, default).map_err(to_report)?;
            format!("status {}{}", style(status.name).cyan(), default_marker(default))
        }
        CatalogCommands::Priority { name, default } => {
            let priority = store.add_priority(&name, default).map_err(to_report)?;
            format!("priority {}{}", style(priority.name).cyan(), default_marker(default))
        }
        CatalogCommands::Version { project, name } => {
            let version = store.add_version(&project, &name).map_err(to_report)?;
            format!(
                "version {} of {}",
                style(version.name).cyan(),
                style(project).cyan()
            )
        }
        CatalogCommands::Field {
            name,
            format,
            values,
            required,
            for_all,
            projects,
        } => {
            if format == FieldFormat::List && values.is_empty() {
                return Err(miette::miette!(
                    help = "pass the allowed values with --values a,b,c",
                    "List field '{}' needs at least one value",
                    name
                ));
            }
            let field = store
                .add_custom_field(&NewCustomField {
                    name,
                    format,
                    possible_values: values,
                    is_required: required,
                    is_for_all: for_all,
                    projects,
                })
                .map_err(to_report)?;
            format!(
                "custom field {} ({})",
                style(field.name).cyan(),
                field.format
            )
        }
        CatalogCommands::Show { project } => {
            let project = store.require_project(&project).map_err(to_report)?;
            let catalog = ProjectCatalog::load(store, project).map_err(to_report)?;
            return show_catalog(&catalog, global.format);
        }
    };

    if !global.quiet {
        println!("{} Created {}", style("✓").green(), created);
    }
    Ok(())
}

fn to_report(err: crate::core::store::StoreError) -> miette::Report {
    miette::miette!("{}", err)
}

fn default_marker(default: bool) -> String {
    if default {
        style(" (default)").dim().to_string()
    } else {
        String::new()
    }
}

#[derive(Serialize)]
struct CatalogJson<'a> {
    project: &'a str,
    name: &'a str,
    members: Vec<&'a str>,
    trackers: Vec<&'a str>,
    statuses: Vec<&'a str>,
    default_status: Option<&'a str>,
    priorities: Vec<&'a str>,
    default_priority: Option<&'a str>,
    versions: Vec<&'a str>,
    custom_fields: Vec<&'a str>,
}

fn show_catalog(catalog: &ProjectCatalog, format: OutputFormat) -> Result<()> {
    let default_status = catalog.statuses.iter().find(|s| s.is_default);
    let default_priority = catalog.priorities.iter().find(|p| p.is_default);

    if format == OutputFormat::Json {
        let json = CatalogJson {
            project: &catalog.project.identifier,
            name: &catalog.project.name,
            members: catalog.members.iter().map(|u| u.login.as_str()).collect(),
            trackers: catalog.trackers.iter().map(|t| t.name.as_str()).collect(),
            statuses: catalog.statuses.iter().map(|s| s.name.as_str()).collect(),
            default_status: default_status.map(|s| s.name.as_str()),
            priorities: catalog.priorities.iter().map(|p| p.name.as_str()).collect(),
            default_priority: default_priority.map(|p| p.name.as_str()),
            versions: catalog.versions.iter().map(|v| v.name.as_str()).collect(),
            custom_fields: catalog
                .custom_fields
                .iter()
                .filter(|f| f.is_enabled_for(catalog.project.id))
                .map(|f| f.name.as_str())
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        return Ok(());
    }

    let style_md = format == OutputFormat::Md;
    let mut builder = Builder::default();
    builder.push_record(["Kind", "Values"]);
    builder.push_record(["Members".to_string(), join(catalog.members.iter().map(|u| u.login.as_str()))]);
    builder.push_record(["Trackers".to_string(), join(catalog.trackers.iter().map(|t| t.name.as_str()))]);
    builder.push_record([
        "Statuses".to_string(),
        join(catalog.statuses.iter().map(|s| s.name.as_str())),
    ]);
    builder.push_record([
        "Default status".to_string(),
        default_status.map(|s| s.name.clone()).unwrap_or_else(|| "-".to_string()),
    ]);
    builder.push_record([
        "Priorities".to_string(),
        join(catalog.priorities.iter().map(|p| p.name.as_str())),
    ]);
    builder.push_record([
        "Default priority".to_string(),
        default_priority.map(|p| p.name.clone()).unwrap_or_else(|| "-".to_string()),
    ]);
    builder.push_record(["Versions".to_string(), join(catalog.versions.iter().map(|v| v.name.as_str()))]);

    let mut fields = Builder::default();
    fields.push_record(["Custom field", "Format", "Required", "Values"]);
    for field in catalog
        .custom_fields
        .iter()
        .filter(|f| f.is_enabled_for(catalog.project.id))
    {
        fields.push_record([
            field.name.clone(),
            field.format.to_string(),
            if field.is_required { "yes" } else { "no" }.to_string(),
            truncate_str(&field.possible_values.join(", "), 40),
        ]);
    }

    println!(
        "{} {}",
        style(&catalog.project.identifier).cyan().bold(),
        catalog.project.name
    );
    let table_style = |b: Builder| {
        if style_md {
            b.build().with(Style::markdown()).to_string()
        } else {
            b.build().with(Style::rounded()).to_string()
        }
    };
    println!("{}", table_style(builder));
    println!("{}", table_style(fields));
    Ok(())
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
