//! `trackport import` command - Bulk-create issues from a CSV file

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::cli::helpers::open_session;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::ImportRun;
use crate::core::{Config, Workspace};
use crate::import::{
    capitalize, import_csv, DryRunSink, ImportError, ImportOptions, ImportResult, LineError,
    ProjectCatalog, StandardField,
};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Identifier of the project the issues are created in
    pub project: Option<String>,

    /// CSV file to import
    pub file: Option<PathBuf>,

    /// Validate every row without creating issues
    #[arg(long)]
    pub dry_run: bool,

    /// Print a CSV template with the configured header labels
    #[arg(long)]
    pub template: bool,
}

/// JSON shape of an import outcome
#[derive(Serialize)]
struct ImportReport<'a> {
    #[serde(flatten)]
    result: &'a ImportResult,
    dry_run: bool,
    /// The store failed before every row was tried
    aborted: bool,
    summary: String,
    report: Vec<&'a LineError>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        let workspace = match &global.workspace {
            Some(path) => Workspace::discover_from(path).ok(),
            None => Workspace::discover().ok(),
        };
        let options = Config::load(workspace.as_ref()).import_options();
        print!("{}", csv_template(&options));

        // Hint on stderr so redirected output stays a clean CSV
        eprintln!();
        eprintln!(
            "{} Template generated. Redirect to file: trackport import --template > issues.csv",
            style("→").blue()
        );
        return Ok(());
    }

    let project_id = args.project.clone().ok_or_else(|| {
        miette::miette!("Project required. Usage: trackport import <project> issues.csv")
    })?;
    let file_path = args.file.clone().ok_or(ImportError::NoFile)?;
    if !file_path.exists() {
        return Err(miette::miette!("File not found: {}", file_path.display()));
    }
    let data = std::fs::read(&file_path).into_diagnostic()?;

    let session = open_session(global)?;
    let mut store = session.store;
    let options = session.config.import_options();

    let project = store
        .require_project(&project_id)
        .map_err(|e| miette::miette!("{}", e))?;
    let catalog = ProjectCatalog::load(&store, project.clone()).map_err(|e| miette::miette!("{}", e))?;

    if global.format != OutputFormat::Json && !global.quiet {
        println!(
            "{} Importing issues into {} from {}{}",
            style("→").blue(),
            style(&project.identifier).cyan(),
            style(file_path.display()).yellow(),
            if args.dry_run { style(" (dry run)").dim().to_string() } else { String::new() }
        );
        println!();
    }

    let outcome = if args.dry_run {
        import_csv(&data, &catalog, &mut DryRunSink::new(&store), &options)
    } else {
        import_csv(&data, &catalog, &mut store, &options)
    };

    // A store failure partway through still leaves the earlier rows saved,
    // so the run is recorded and reported before the error is returned
    let (result, aborted) = match outcome {
        Ok(result) => (result, None),
        Err(ImportError::Aborted {
            line,
            result,
            source,
        }) => {
            let failure = miette::miette!(
                code = "trackport::import::aborted",
                help = "issues saved before this line were kept",
                "Import stopped at line {}: {}",
                line,
                source
            );
            (*result, Some(failure))
        }
        Err(e) => return Err(e.into()),
    };

    if !args.dry_run {
        let run = ImportRun {
            run_id: result.run_id.clone(),
            project_id: project.id,
            file_name: file_name(&file_path),
            file_sha256: format!("{:x}", Sha256::digest(&data)),
            total: result.total,
            succeeded: result.succeeded,
            imported_at: chrono::Utc::now(),
        };
        match store.record_import_run(&run) {
            Ok(()) => {}
            Err(e) if aborted.is_some() => {
                tracing::warn!(run_id = %run.run_id, "could not record aborted import: {}", e);
            }
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    }

    match global.format {
        OutputFormat::Json => {
            let report = ImportReport {
                result: &result,
                dry_run: args.dry_run,
                aborted: aborted.is_some(),
                summary: result.summary(),
                report: result.report(),
            };
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{}", json);
        }
        _ => print_result(&result, args.dry_run),
    }

    if let Some(failure) = aborted {
        return Err(failure);
    }
    if !result.is_success() {
        return Err(miette::miette!(
            "Import completed with {} failed row(s)",
            result.failed()
        ));
    }

    Ok(())
}

fn print_result(result: &ImportResult, dry_run: bool) {
    for error in result.report() {
        match error.persisted {
            Some(id) => eprintln!(
                "{} Line {}: {} {}",
                style("✗").red(),
                error.line,
                error.message,
                style(format!("(issue #{} was saved)", id)).dim()
            ),
            None => eprintln!("{} Line {}: {}", style("✗").red(), error.line, error.message),
        }
    }
    if !result.errors.is_empty() {
        eprintln!();
    }

    if result.is_success() {
        println!("{} {}", style("✓").green(), result.summary());
    } else {
        println!("{} {}", style("!").yellow(), result.summary());
    }
    println!("  {} {}", style("run:").dim(), result.run_id);

    if dry_run {
        println!();
        println!("{}", style("Dry run complete. No issues were created.").yellow());
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Header row with the configured labels followed by one example row
pub fn csv_template(options: &ImportOptions) -> String {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let fields: Vec<StandardField> = options.labels.fields().collect();

    let headers: Vec<String> = fields
        .iter()
        .map(|f| capitalize(options.labels.label(*f).unwrap_or(f.as_str())))
        .collect();
    let example: Vec<&str> = fields.iter().map(|f| example_value(*f)).collect();

    // Writing into a Vec cannot fail
    let _ = wtr.write_record(&headers);
    let _ = wtr.write_record(&example);
    wtr.into_inner()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn example_value(field: StandardField) -> &'static str {
    match field {
        StandardField::Author => "alice",
        StandardField::Subject => "Fix login crash",
        StandardField::Tracker => "Bug",
        StandardField::Description => "Crash when the password is empty",
        StandardField::Assignee => "bob",
        StandardField::EstimatedHours => "2.5",
        StandardField::Status => "New",
        StandardField::StartDate => "2024-03-01",
        StandardField::DueDate => "2024-03-08",
        StandardField::Priority => "Normal",
        StandardField::Created => "2024-02-28 09:00",
        StandardField::Version => "1.0",
    }
}
