//! Defines the command-line arguments and subcommands for the regress CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use crate::config::{DEFAULT_ROOT, ENV_ROOT};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "regress",
    version,
    about = "Inspect and maintain canonical regression artifacts."
)]
pub struct RegressArgs {
    /// Directory holding canonical artifacts.
    #[arg(long, global = true, env = ENV_ROOT, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List stored artifacts with their size and sha256 digest.
    List,
    /// Print the contents of one artifact.
    Show {
        /// The storage key of the artifact.
        #[arg(required = true)]
        key: String,
    },
    /// Delete artifacts so the next run records them afresh.
    Remove {
        /// The storage keys to delete.
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Delete every artifact in the store.
    Clear,
}
