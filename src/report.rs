//! Rendering of failed checks.
//!
//! A [`RegressTestResult`] pairs the rendered live value, the rendered
//! canonical value, and the comparator's failure. It exists only long enough
//! to show the user a diff and ask the policy what to do.

use crate::comparator::Mismatch;
use difference::{Changeset, Difference};
use std::io::Write;
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// One failed comparison, ready to be reported.
#[derive(Debug, Clone)]
pub struct RegressTestResult {
    pub key: String,
    /// The live value as the serializer writes it.
    pub live: String,
    /// The canonical value as stored, or `None` when nothing is stored yet.
    pub canonical: Option<String>,
    pub failure: Mismatch,
}

impl RegressTestResult {
    pub fn new(key: impl Into<String>, live: String, canonical: Option<String>, failure: Mismatch) -> Self {
        Self {
            key: key.into(),
            live,
            canonical,
            failure,
        }
    }

    /// Line diff from canonical to live, `-` for removed and `+` for added lines.
    pub fn format_diff(&self) -> String {
        self.render(false)
    }

    /// Same as [`format_diff`](Self::format_diff) with ANSI colors.
    pub fn format_diff_colored(&self) -> String {
        self.render(true)
    }

    fn render(&self, colored: bool) -> String {
        let mut out = if colored { Buffer::ansi() } else { Buffer::no_color() };
        let canonical = self.canonical.as_deref().unwrap_or("");
        let changeset = Changeset::new(trim_final_newline(canonical), trim_final_newline(&self.live), "\n");
        let _ = write_diff(&mut out, &changeset.diffs);
        String::from_utf8_lossy(out.as_slice()).into_owned()
    }
}

// A trailing newline would otherwise show up as an empty last line.
fn trim_final_newline(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}

fn write_diff(out: &mut Buffer, diffs: &[Difference]) -> std::io::Result<()> {
    for diff in diffs {
        let (marker, color, text) = match diff {
            Difference::Same(x) => (' ', None, x),
            Difference::Add(x) => ('+', Some(Color::Green), x),
            Difference::Rem(x) => ('-', Some(Color::Red), x),
        };
        match color {
            Some(c) => out.set_color(ColorSpec::new().set_fg(Some(c)))?,
            None => out.reset()?,
        }
        for line in text.split('\n') {
            writeln!(out, "{}{}", marker, line)?;
        }
    }
    out.reset()
}
