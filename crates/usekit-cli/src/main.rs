//! usekit CLI
//!
//! Adds and removes Python development tools, their configuration and their
//! integrations in the project at `--project` (or the current directory).

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use usekit_core::{Console, Project};
use usekit_tools::ToolRegistry;

use cli::{CiService, Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`). `--verbose`
/// forces `debug`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .compact();
    if let Err(e) = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init() {
        eprintln!("{}: failed to set up logging: {}", "warning".yellow().bold(), e);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    usekit_model::check_orderings()?;

    let root = match &cli.global.project {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let project = Project::open(root, &cli.global.overrides(), Console::terminal())?;
    tracing::debug!(options = ?project.options(), "resolved options");
    let registry = ToolRegistry::with_builtins();

    match cli.command {
        Commands::Tool { name, remove } => commands::run_tool(&project, &registry, &name, remove),
        Commands::Rule { rules, remove, ignore } => commands::run_rule(&project, &registry, &rules, remove, ignore),
        Commands::Ci {
            service: CiService::Bitbucket { remove },
        } => commands::run_tool(&project, &registry, "bitbucket", remove),
        Commands::List => commands::run_list(&project, &registry),
    }
}
