//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface definition for wpsnap.
///
/// This is the top-level parser that handles global options and
/// dispatches to subcommands.
#[derive(Parser)]
#[command(name = "wpsnap")]
#[command(about = "Snapshot, restore and back up WordPress installations")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
