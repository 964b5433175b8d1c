//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--json, --config, --verbose, --ascii) are inherited by all subcommands
//! - Running without a subcommand performs the full pipeline (`run`)

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// treemirror - mirror local trees onto a remote host and restart its services
#[derive(Parser, Debug)]
#[command(name = "treemirror")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Run 'treemirror' without arguments to execute the full pipeline.")]
pub struct Cli {
    /// Emit NDJSON events and JSON results on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (default: $TREEMIRROR_CONFIG or ./treemirror.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Plain ASCII icons instead of unicode
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Stop services, back up, wipe, mirror, provision and restart (default)
    Run,

    /// Only check that the remote host is reachable
    Check,

    /// Show the supervisor state of every configured service
    Status,

    /// Print the remote commands each stage would run, without connecting
    Plan,
}

impl Cli {
    /// The subcommand to execute, `run` when none was given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }

    /// Default log level for `-v` counts when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
