//! Configuration for a regress run.
//!
//! Tests run under the standard harness cannot take extra command-line
//! flags, so the same switches are read from the environment:
//!
//! | Variable                 | Effect                                         |
//! |--------------------------|------------------------------------------------|
//! | `REGRESS_ROOT`           | directory holding canonical artifacts          |
//! | `REGRESS_CANONIZE`       | accept every mismatch as the new canonical     |
//! | `REGRESS_INTERACTIVE`    | ask on the terminal before accepting           |
//! | `REGRESS_RECORD_MISSING` | record absent artifacts (default on)           |
//!
//! Custom harnesses (`harness = false`) can flatten [`CanonizeArgs`] into
//! their own clap parser instead.

use clap::Args;
use std::path::PathBuf;

/// Directory used when `REGRESS_ROOT` is unset, relative to the crate root.
pub const DEFAULT_ROOT: &str = "tests/regress_data";

pub const ENV_ROOT: &str = "REGRESS_ROOT";
pub const ENV_CANONIZE: &str = "REGRESS_CANONIZE";
pub const ENV_INTERACTIVE: &str = "REGRESS_INTERACTIVE";
pub const ENV_RECORD_MISSING: &str = "REGRESS_RECORD_MISSING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressConfig {
    pub root: PathBuf,
    /// Accept mismatches silently ("online canonization").
    pub canonize: bool,
    /// Prompt before accepting a mismatch.
    pub interactive: bool,
    /// Record a live value when no canonical value exists yet. When off, the
    /// canonize policy is consulted instead.
    pub record_missing: bool,
    pub use_colors: bool,
}

impl Default for RegressConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            canonize: false,
            interactive: false,
            record_missing: true,
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

impl RegressConfig {
    /// Defaults overridden by the `REGRESS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup(ENV_ROOT).filter(|r| !r.is_empty()) {
            config.root = PathBuf::from(root);
        }
        if let Some(value) = lookup(ENV_CANONIZE) {
            config.canonize = is_truthy(&value);
        }
        if let Some(value) = lookup(ENV_INTERACTIVE) {
            config.interactive = is_truthy(&value);
        }
        if let Some(value) = lookup(ENV_RECORD_MISSING) {
            config.record_missing = is_truthy(&value);
        }
        config
    }

    /// Environment configuration with command-line flags layered on top.
    pub fn from_args(args: &CanonizeArgs) -> Self {
        let mut config = Self::from_env();
        if let Some(root) = &args.regress_root {
            config.root = root.clone();
        }
        config.canonize |= args.canonize;
        config.interactive |= args.canonize_interactive;
        if args.no_record_missing {
            config.record_missing = false;
        }
        config
    }
}

/// Flags a custom test harness can `#[command(flatten)]` into its parser.
#[derive(Debug, Clone, Default, Args)]
pub struct CanonizeArgs {
    /// Do canonization online: accept changed values as the new canonical ones.
    #[arg(long)]
    pub canonize: bool,
    /// Ask on the terminal before accepting a changed value.
    #[arg(long)]
    pub canonize_interactive: bool,
    /// Fail instead of recording when no canonical value exists.
    #[arg(long)]
    pub no_record_missing: bool,
    /// Directory holding canonical artifacts.
    #[arg(long, value_name = "DIR")]
    pub regress_root: Option<PathBuf>,
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
