//! `trackport issues` command - List the issues of a project

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{open_session, truncate_str, tsv_writer};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::IssueRow;

#[derive(clap::Args, Debug)]
pub struct IssuesArgs {
    /// Project identifier
    pub project: String,

    /// Only show issues of this tracker
    #[arg(long, short = 't')]
    pub tracker: Option<String>,

    /// Limit output to N issues
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn run(args: IssuesArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = session
        .store
        .require_project(&args.project)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut issues = session
        .store
        .project_issues(project.id)
        .map_err(|e| miette::miette!("{}", e))?;
    if let Some(tracker) = &args.tracker {
        issues.retain(|i| i.tracker.eq_ignore_ascii_case(tracker));
    }
    if let Some(limit) = args.limit {
        issues.truncate(limit);
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&issues).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            let mut wtr = tsv_writer(std::io::stdout());
            wtr.write_record([
                "ID", "TRACKER", "STATUS", "PRIORITY", "SUBJECT", "AUTHOR", "ASSIGNEE", "VERSION",
                "CREATED",
            ])
            .into_diagnostic()?;
            for issue in &issues {
                wtr.write_record([
                    issue.id.to_string(),
                    issue.tracker.clone(),
                    issue.status.clone(),
                    issue.priority.clone(),
                    issue.subject.clone(),
                    issue.author.clone(),
                    issue.assignee.clone().unwrap_or_default(),
                    issue.version.clone().unwrap_or_default(),
                    issue.created_on.to_rfc3339(),
                ])
                .into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Auto | OutputFormat::Md => {
            if issues.is_empty() {
                println!("No issues found in {}", style(&project.identifier).cyan());
                return Ok(());
            }
            let table = issue_table(&issues);
            if global.format == OutputFormat::Md {
                println!("{}", table.build().with(Style::markdown()));
            } else {
                println!("{}", table.build().with(Style::rounded()));
                if !global.quiet {
                    println!();
                    println!("{} issue(s)", style(issues.len()).cyan());
                }
            }
        }
    }

    Ok(())
}

fn issue_table(issues: &[IssueRow]) -> Builder {
    let mut builder = Builder::default();
    builder.push_record([
        "#", "Tracker", "Status", "Priority", "Subject", "Author", "Assignee", "Version", "Created",
    ]);
    for issue in issues {
        builder.push_record([
            issue.id.to_string(),
            issue.tracker.clone(),
            issue.status.clone(),
            issue.priority.clone(),
            truncate_str(&issue.subject, 40),
            issue.author.clone(),
            issue.assignee.clone().unwrap_or_else(|| "-".to_string()),
            issue.version.clone().unwrap_or_else(|| "-".to_string()),
            issue.created_on.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    builder
}
