//! # Canonize Policies
//!
//! When a live value disagrees with its canonical value, the policy decides
//! whether the live value becomes the new canonical value. Approval makes the
//! check pass and overwrites storage; refusal surfaces the original mismatch.

use crate::config::RegressConfig;
use crate::context::RegressContext;
use crate::report::RegressTestResult;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Asks a human whether a changed value should be accepted.
pub trait UserInteraction: Send + Sync {
    fn ask_canonize(&self, context: &dyn RegressContext, result: &RegressTestResult) -> bool;
}

/// What to do with a mismatching or missing canonical value.
pub enum CanonizePolicy {
    /// Never overwrite; every mismatch fails the test.
    AlwaysFail,
    /// Online canonization: every mismatch is accepted silently.
    AlwaysAccept,
    /// Ask through the given interaction.
    Prompt(Box<dyn UserInteraction>),
}

impl CanonizePolicy {
    /// Picks the policy a configuration asks for. The canonize flag wins
    /// over interactive mode.
    pub fn from_config(config: &RegressConfig) -> Self {
        if config.canonize {
            CanonizePolicy::AlwaysAccept
        } else if config.interactive {
            CanonizePolicy::Prompt(Box::new(TerminalInteraction))
        } else {
            CanonizePolicy::AlwaysFail
        }
    }

    pub fn ask_canonize(&self, context: &dyn RegressContext, result: &RegressTestResult) -> bool {
        let approved = match self {
            CanonizePolicy::AlwaysFail => false,
            CanonizePolicy::AlwaysAccept => true,
            CanonizePolicy::Prompt(interaction) => interaction.ask_canonize(context, result),
        };
        debug!(key = %result.key, approved = approved, "canonize decision");
        approved
    }
}

impl std::fmt::Debug for CanonizePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonizePolicy::AlwaysFail => f.write_str("AlwaysFail"),
            CanonizePolicy::AlwaysAccept => f.write_str("AlwaysAccept"),
            CanonizePolicy::Prompt(_) => f.write_str("Prompt(..)"),
        }
    }
}

/// Prompts on the controlling terminal: diff on stderr, `y/N` on stdin.
///
/// Answers "no" without prompting when stdin is not a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalInteraction;

impl UserInteraction for TerminalInteraction {
    fn ask_canonize(&self, context: &dyn RegressContext, result: &RegressTestResult) -> bool {
        if !atty::is(atty::Stream::Stdin) {
            return false;
        }
        let diff = if atty::is(atty::Stream::Stderr) {
            result.format_diff_colored()
        } else {
            result.format_diff()
        };
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{} [{}]: {}", context.node_id(), result.key, result.failure);
        let _ = write!(stderr, "{}", diff);
        let _ = write!(stderr, "Canonize '{}'? [y/N] ", result.key);
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => is_yes(&line),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
