//! `trackport history` command - Show past imports of a project

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{open_session, truncate_str, tsv_writer};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Project identifier
    pub project: String,

    /// Limit to the last N imports
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn run(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = session
        .store
        .require_project(&args.project)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut runs = session
        .store
        .import_runs(project.id)
        .map_err(|e| miette::miette!("{}", e))?;
    if let Some(limit) = args.limit {
        runs.truncate(limit);
    }

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&runs).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            let mut wtr = tsv_writer(std::io::stdout());
            wtr.write_record(["RUN", "FILE", "SHA256", "TOTAL", "SUCCEEDED", "IMPORTED"])
                .into_diagnostic()?;
            for run in &runs {
                wtr.write_record([
                    run.run_id.clone(),
                    run.file_name.clone(),
                    run.file_sha256.clone(),
                    run.total.to_string(),
                    run.succeeded.to_string(),
                    run.imported_at.to_rfc3339(),
                ])
                .into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Auto | OutputFormat::Md => {
            if runs.is_empty() {
                println!("No imports recorded for {}", style(&project.identifier).cyan());
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["Run", "File", "Created", "Failed", "Imported"]);
            for run in &runs {
                builder.push_record([
                    run.run_id.clone(),
                    truncate_str(&run.file_name, 30),
                    format!("{}/{}", run.succeeded, run.total),
                    (run.total - run.succeeded).to_string(),
                    run.imported_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ]);
            }
            let table = if global.format == OutputFormat::Md {
                builder.build().with(Style::markdown()).to_string()
            } else {
                builder.build().with(Style::rounded()).to_string()
            };
            println!("{}", table);
        }
    }

    Ok(())
}
