pub mod errors;
pub mod render;
pub mod tracing_init;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Finds unparsed recipe ingredients and resolves them in reviewed batches",
    long_about = "garde walks a recipe service's catalog, groups ingredients whose unit or\n\
                  food could not be parsed into shared patterns, and lets an operator\n\
                  resolve each pattern in one reviewed batch instead of one ingredient at\n\
                  a time.\n\n\
                  Examples:\n  \
                  garde run\n  \
                  garde --json-errors run\n  \
                  garde session show\n  \
                  garde session discard"
)]
pub struct Cli {
    /// Output all errors as structured JSON to stderr
    #[arg(long, global = true, help = "Output errors in JSON format")]
    pub json_errors: bool,

    /// Show what would be sent to the recipe service without sending it
    #[arg(long, global = true, help = "Preview batch operations without executing them")]
    pub dry_run: bool,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count, help = "Increase logging verbosity")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve unparsed ingredient patterns interactively
    Run,
    /// Inspect or clear the durable session file
    Session(SessionCommands),
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Print a summary of the current session's progress
    Show,
    /// Delete the session file and start fresh next run
    Discard,
}
