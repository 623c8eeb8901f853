//! The regress command-line interface.
//!
//! This module is the main entry point for all CLI commands. Every command
//! works on a filesystem store rooted at `--root` (or `REGRESS_ROOT`).

use crate::cli::args::{Command, RegressArgs};
use crate::cli::output::{print_contents, print_listing, print_status, ArtifactInfo};
use crate::error::{RegressError, RegressResult};
use crate::storage::{FsStorage, RegressStorage};
use clap::Parser;
use miette::IntoDiagnostic;
use std::io::Read;
use tracing::{debug, Level};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> miette::Result<()> {
    let args = RegressArgs::parse();
    init_logging(args.verbose);

    let storage = FsStorage::new(&args.root);
    debug!(root = %args.root.display(), "using canonical storage");

    // Dispatch to the appropriate subcommand handler.
    match args.command {
        Command::List => handle_list(&storage),
        Command::Show { key } => handle_show(&storage, &key),
        Command::Remove { keys } => handle_remove(&storage, &keys),
        Command::Clear => handle_clear(&storage),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .try_init();
}

/// Reads every artifact and summarizes it.
pub fn collect_artifacts(storage: &dyn RegressStorage) -> RegressResult<Vec<ArtifactInfo>> {
    let mut artifacts = Vec::new();
    for key in storage.keys()? {
        let Some(mut reader) = storage.open_read(&key)? else {
            continue;
        };
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| RegressError::storage(&key, e))?;
        artifacts.push(ArtifactInfo::from_bytes(key, &bytes));
    }
    Ok(artifacts)
}

fn handle_list(storage: &FsStorage) -> miette::Result<()> {
    let artifacts = collect_artifacts(storage)?;
    print_listing(&artifacts).into_diagnostic()
}

fn handle_show(storage: &FsStorage, key: &str) -> miette::Result<()> {
    let Some(mut reader) = storage.open_read(key)? else {
        return Err(RegressError::MissingCanonical {
            key: key.to_string(),
        }
        .into());
    };
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| RegressError::storage(key, e))?;
    print_contents(&bytes).into_diagnostic()
}

fn handle_remove(storage: &FsStorage, keys: &[String]) -> miette::Result<()> {
    let mut removed = 0;
    for key in keys {
        if storage.remove(key)? {
            removed += 1;
        } else {
            eprintln!("warning: no artifact named '{}'", key);
        }
    }
    print_status(&format!("removed {} artifact(s)", removed)).into_diagnostic()
}

fn handle_clear(storage: &FsStorage) -> miette::Result<()> {
    let count = storage.keys()?.len();
    storage.ensure_exists(true)?;
    print_status(&format!("cleared {} artifact(s) from {}", count, storage.root().display()))
        .into_diagnostic()
}
