//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use usekit_core::{BackendKind, OptionOverrides};

/// usekit - Add and remove Python development tools in a project
#[derive(Parser, Debug)]
#[command(name = "usekit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, env = "USEKIT_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,

    /// Do not let the dependency backend use the network
    #[arg(long, global = true, env = "USEKIT_OFFLINE", value_parser = FalseyValueParser::new())]
    pub offline: bool,

    /// Do not let the dependency backend update the lock file
    #[arg(long, global = true, env = "USEKIT_FROZEN", value_parser = FalseyValueParser::new())]
    pub frozen: bool,

    /// How dependencies are recorded: uv, none or auto
    #[arg(long, global = true, env = "USEKIT_BACKEND", value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,
}

fn parse_backend(value: &str) -> Result<BackendKind, String> {
    value.parse::<BackendKind>().map_err(|e| e.to_string())
}

impl GlobalArgs {
    /// Options given on the command line; unset flags defer to
    /// `[tool.usekit]`.
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            quiet: self.quiet.then_some(true),
            offline: self.offline.then_some(true),
            frozen: self.frozen.then_some(true),
            backend: self.backend,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Add a development tool to the project
    ///
    /// Examples:
    ///   usekit tool ruff             # Add Ruff
    ///   usekit tool ruff --remove    # Remove it again
    Tool {
        /// Name of the tool (use 'usekit list' to see options)
        name: String,

        /// Remove the tool instead
        #[arg(long)]
        remove: bool,
    },

    /// Select or ignore linter rules
    ///
    /// Examples:
    ///   usekit rule PT E501          # Select rules
    ///   usekit rule E501 --ignore    # Ignore a rule
    ///   usekit rule PT --remove      # Deselect a rule
    Rule {
        /// Rule codes
        #[arg(required = true)]
        rules: Vec<String>,

        /// Deselect (or with --ignore, stop ignoring) the rules
        #[arg(long)]
        remove: bool,

        /// Ignore the rules instead of selecting them
        #[arg(long)]
        ignore: bool,
    },

    /// Configure a CI service
    Ci {
        #[command(subcommand)]
        service: CiService,
    },

    /// List the available tools and whether the project uses them
    List,
}

/// Supported CI services
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CiService {
    /// Bitbucket Pipelines
    Bitbucket {
        /// Remove the pipeline configuration instead
        #[arg(long)]
        remove: bool,
    },
}
