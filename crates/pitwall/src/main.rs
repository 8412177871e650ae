//! Pitwall operator CLI
//!
//! Debug surface over the interpretation core: resolve names, validate
//! intent files and inspect teammate-gap coverage against a read-only
//! analytics snapshot.

use clap::{Parser, Subcommand};
use pitwall_logging::{init_logging, LogConfig};
use std::process::ExitCode;

mod cli;

use cli::error::HelpfulError;

#[derive(Parser, Debug)]
#[command(name = "pitwall", version, about = "Operator tools for the Pitwall analytics interpreter")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Only warnings and errors on stderr
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve driver names to canonical driver ids
    ResolveDriver(cli::resolve::ResolveDriverArgs),

    /// Resolve track names to canonical track ids
    ResolveTrack(cli::resolve::ResolveTrackArgs),

    /// Validate (and optionally resolve) a query intent JSON file
    Validate(cli::validate::ValidateArgs),

    /// Show which season a driver's teammate gap would be reported for
    Coverage(cli::coverage::CoverageArgs),

    /// Show resolved paths and default tunables
    Config(cli::config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "pitwall",
        verbose: cli.verbose,
        quiet: cli.quiet,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<HelpfulError>() {
                Some(helpful) => eprint!("{}", helpful),
                None => eprintln!("ERROR: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    if let Commands::Config(args) = command {
        return cli::config::run(args);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match command {
            Commands::ResolveDriver(args) => cli::resolve::run_driver(args).await,
            Commands::ResolveTrack(args) => cli::resolve::run_track(args).await,
            Commands::Validate(args) => cli::validate::run(args).await,
            Commands::Coverage(args) => cli::coverage::run(args).await,
            Commands::Config(args) => cli::config::run(args),
        }
    })
}
