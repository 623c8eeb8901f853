//! # Test Context
//!
//! A [`RegressContext`] identifies the running test, names its storage
//! entries, and may supply a comparator. [`TestContext`] binds this to the
//! standard test harness, which names each test thread after the test's
//! path inside its binary (`workflow::simple`). The binary's crate name is
//! prepended (`quickstart::workflow::simple`), since test binaries of one
//! package share a store and may reuse test paths.

use crate::comparator::{Comparator, EqComparator};
use crate::error::{RegressError, RegressResult};
use crate::file_type::FileType;
use std::fmt::Debug;

/// Identity and naming for one test.
pub trait RegressContext {
    /// The test's fully qualified identity.
    fn node_id(&self) -> &str;

    /// Builds the storage key for an artifact of `file_type`.
    fn storage_name(&self, file_type: &FileType, suffix: Option<&str>) -> String;

    /// Maps an explicit resource filename to its storage key.
    fn storage_name_from_filename(&self, filename: &str) -> String;

    /// The comparator to use for `T`, or `None` to fall back to
    /// [`EqComparator`].
    fn comparator<T>(&self) -> Option<Box<dyn Comparator<T>>>
    where
        Self: Sized,
        T: PartialEq + Debug + 'static,
    {
        None
    }
}

/// Transforms a test node id into a filesystem-safe name.
pub fn filename_from_node_id(node_id: &str) -> String {
    node_id
        .to_lowercase()
        .replace(['/', ':', '.'], "_")
}

/// Strips cargo's `-<16 hex digits>` suffix from a test binary's file stem.
pub fn binary_name(stem: &str) -> &str {
    match stem.rsplit_once('-') {
        Some((name, hash))
            if !name.is_empty() && hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            name
        }
        _ => stem,
    }
}

fn current_binary() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    let stem = exe.file_stem()?.to_str()?;
    Some(binary_name(stem).to_string())
}

/// Context for a test run by the standard test harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    node_id: String,
}

impl TestContext {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }

    /// Context for `test_path` inside the test binary named `binary`.
    pub fn in_binary(binary: &str, test_path: &str) -> Self {
        Self::new(format!("{}::{}", binary, test_path))
    }

    /// Context for the test running on the current thread.
    ///
    /// Fails outside a test thread: the main thread and unnamed threads carry
    /// no test identity.
    pub fn current() -> RegressResult<Self> {
        let thread = std::thread::current();
        match thread.name() {
            Some(name) if name != "main" && !name.is_empty() => Ok(match current_binary() {
                Some(binary) => Self::in_binary(&binary, name),
                None => Self::new(name),
            }),
            other => Err(RegressError::NoTestIdentity {
                thread: other.unwrap_or("<unnamed>").to_string(),
            }),
        }
    }
}

impl RegressContext for TestContext {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn storage_name(&self, file_type: &FileType, suffix: Option<&str>) -> String {
        let mut name = filename_from_node_id(&self.node_id);
        if let Some(suffix) = suffix {
            name.push_str(suffix);
        }
        if let Some(ext) = file_type.extension() {
            name.push_str(&ext);
        }
        name
    }

    fn storage_name_from_filename(&self, filename: &str) -> String {
        filename.to_string()
    }

    fn comparator<T>(&self) -> Option<Box<dyn Comparator<T>>>
    where
        T: PartialEq + Debug + 'static,
    {
        Some(Box::new(EqComparator))
    }
}
