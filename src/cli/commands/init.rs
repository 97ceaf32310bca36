//! `trackport init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::store::TrackerStore;
use crate::core::workspace::{Workspace, WorkspaceError};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite .trackport/config.yaml even if the workspace exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            let config = Config::load(Some(&workspace));
            let db_path = config.database_path(&workspace);
            TrackerStore::open(&db_path).map_err(|e| miette::miette!("{}", e))?;

            println!(
                "{} Initialized Trackport workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!("  {} {}", style("config:").dim(), workspace.config_dir().join("config.yaml").display());
            println!("  {} {}", style("database:").dim(), db_path.display());
            println!();
            println!("Next steps:");
            println!(
                "  {} Create a project",
                style("trackport catalog project web \"Website\"").yellow()
            );
            println!(
                "  {} Print a CSV template",
                style("trackport import --template").yellow()
            );
            println!(
                "  {} Import issues",
                style("trackport import web issues.csv").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} Trackport workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("trackport init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
