//! Handles all user-facing output for the CLI.
//!
//! Colors are used only when stdout is a terminal.

use sha2::{Digest, Sha256};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Summary of one stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub key: String,
    pub size: usize,
    pub digest: String,
}

impl ArtifactInfo {
    pub fn from_bytes(key: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            key: key.into(),
            size: bytes.len(),
            digest: sha256_hex(bytes),
        }
    }
}

/// Lowercase hex sha256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn stdout() -> StandardStream {
    let choice = if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Prints one line per artifact: digest prefix, size, key.
pub fn print_listing(artifacts: &[ArtifactInfo]) -> io::Result<()> {
    let mut out = stdout();
    for artifact in artifacts {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, "{}", &artifact.digest[..12])?;
        out.reset()?;
        writeln!(out, " {:>8}  {}", artifact.size, artifact.key)?;
    }
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{} artifact(s)", artifacts.len())?;
    out.reset()
}

/// Prints raw artifact contents.
pub fn print_contents(bytes: &[u8]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    out.flush()
}

/// Prints a one-line status message in green.
pub fn print_status(message: &str) -> io::Result<()> {
    let mut out = stdout();
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    writeln!(out, "{}", message)?;
    out.reset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn artifact_info_records_size() {
        let info = ArtifactInfo::from_bytes("k.json", b"{}\n");
        assert_eq!(info.size, 3);
        assert_eq!(info.digest.len(), 64);
    }
}
