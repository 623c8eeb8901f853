//! Regress error handling.
//!
//! Every failure a check can produce is a variant of [`RegressError`]. The
//! variants keep the kinds apart that a caller must never conflate: a
//! comparison mismatch, an absent artifact, a storage I/O failure, and a
//! malformed artifact are all distinct.

use miette::Diagnostic;
use thiserror::Error;

/// Shorthand result type used throughout the crate.
pub type RegressResult<T> = Result<T, RegressError>;

#[derive(Error, Diagnostic, Debug)]
pub enum RegressError {
    #[error("canonical value for '{key}' differs: {message}")]
    #[diagnostic(
        code(regress::mismatch),
        help("rerun with REGRESS_CANONIZE=1 (or --canonize) to accept the new value")
    )]
    Mismatch {
        key: String,
        message: String,
        /// Rendered line diff between the live and canonical value.
        diff: String,
    },

    #[error("no canonical value recorded for '{key}'")]
    #[diagnostic(
        code(regress::missing),
        help("set REGRESS_RECORD_MISSING=1 or REGRESS_CANONIZE=1 to record it")
    )]
    MissingCanonical { key: String },

    #[error("storage failure for '{key}'")]
    #[diagnostic(code(regress::storage))]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} serialization failed for '{key}': {message}")]
    #[diagnostic(
        code(regress::serialize),
        help("the canonical artifact may be corrupt; inspect it with `regress show`")
    )]
    Serialize {
        key: String,
        format: &'static str,
        message: String,
    },

    #[error("invalid storage key '{key}': {reason}")]
    #[diagnostic(code(regress::invalid_key))]
    InvalidKey { key: String, reason: &'static str },

    #[error("storage key '{key}' is claimed by both '{first}' and '{second}'")]
    #[diagnostic(
        code(regress::key_collision),
        help("pass a distinct suffix to one of the checks")
    )]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },

    #[error("cannot identify the running test (thread: {thread})")]
    #[diagnostic(
        code(regress::no_test_identity),
        help("call TestContext::current() from inside a #[test] function or use TestContext::new")
    )]
    NoTestIdentity { thread: String },
}

impl RegressError {
    pub(crate) fn storage(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            key: key.into(),
            source,
        }
    }

    pub(crate) fn serialize(format: &'static str, message: impl ToString) -> Self {
        Self::Serialize {
            key: String::new(),
            format,
            message: message.to_string(),
        }
    }

    /// Attaches the storage key to errors raised before the key was known.
    pub(crate) fn with_key(self, key: &str) -> Self {
        match self {
            Self::Serialize {
                key: existing,
                format,
                message,
            } if existing.is_empty() => Self::Serialize {
                key: key.to_string(),
                format,
                message,
            },
            other => other,
        }
    }

    /// Renders the error through miette's report handler, diff included.
    pub fn render(self) -> String {
        let diff = match &self {
            Self::Mismatch { diff, .. } => Some(diff.clone()),
            _ => None,
        };
        let mut out = format!("{:?}", miette::Report::new(self));
        if let Some(diff) = diff {
            out.push('\n');
            out.push_str(&diff);
        }
        out
    }

    /// True for a comparison failure, as opposed to an infrastructure one.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_error_picks_up_key_once() {
        let err = RegressError::serialize("json", "trailing comma").with_key("a.json");
        assert!(matches!(&err, RegressError::Serialize { key, .. } if key == "a.json"));

        let err = err.with_key("b.json");
        assert!(matches!(&err, RegressError::Serialize { key, .. } if key == "a.json"));
    }

    #[test]
    fn storage_error_keeps_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RegressError::storage("k", io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("denied"));
        assert!(!err.is_mismatch());
    }

    #[test]
    fn render_appends_diff_on_its_own_line() {
        let err = RegressError::Mismatch {
            key: "k.json".to_string(),
            message: "values differ".to_string(),
            diff: "-1\n+2\n".to_string(),
        };
        assert!(err.is_mismatch());
        assert!(err.render().ends_with("\n-1\n+2\n"));
    }
}
