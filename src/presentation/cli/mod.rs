pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::run;

/// Phrase the operator must type before `clear` wipes anything.
pub const CONFIRMATION_PHRASE: &str = "DELETE ALL";

#[derive(Parser, Debug)]
#[command(name = "eventbot", version, about = "PDF assistant chatbot for event documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Print what each store currently holds
    Summary,
    /// Remove every vector, table and schema entry
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Inspect and maintain the table schema registry
    Schemas {
        #[command(subcommand)]
        command: SchemaCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SchemaCommand {
    /// List every registered table
    List,
    /// Counts and column type distribution
    Summary,
    /// Report structural problems in the registry
    Validate,
    /// Find tables by name or description
    Search { keyword: String },
    /// Write Markdown documentation to PATH, or stdout
    Export { path: Option<PathBuf> },
    /// Copy the registry to a timestamped backup file
    Backup,
    /// Replace the registry with a backup file
    Restore { path: String },
    /// Drop stale entries
    Cleanup {
        /// Remove entries older than this many days
        #[arg(long)]
        days: Option<i64>,
        /// Keep only entries whose file hash is listed
        #[arg(long = "keep", num_args = 1..)]
        keep: Vec<String>,
    },
}

impl Cli {
    pub fn command(self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
