use clap::Parser;
use miette::Result;
use trackport::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    // TRACKPORT_LOG wins over --verbose
    let default_level = if global.verbose { "trackport=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("TRACKPORT_LOG")
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    match cli.command {
        Commands::Init(args) => trackport::cli::commands::init::run(args),
        Commands::Import(args) => trackport::cli::commands::import::run(args, &global),
        Commands::Catalog(cmd) => trackport::cli::commands::catalog::run(cmd, &global),
        Commands::Issues(args) => trackport::cli::commands::issues::run(args, &global),
        Commands::History(args) => trackport::cli::commands::history::run(args, &global),
        Commands::Completions(args) => trackport::cli::commands::completions::run(args),
    }
}
