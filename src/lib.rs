//! # Regress
//!
//! Canonical-value ("golden file") regression testing. The first run of a
//! check records the value a test produces; later runs compare against that
//! canonical value and fail on any difference, unless the canonize policy
//! accepts the change.
//!
//! ```rust,no_run
//! use regress::{assert_regress, RegressFixture};
//!
//! #[test]
//! fn report_is_stable() {
//!     let fixture = RegressFixture::current().unwrap();
//!     assert_regress!(fixture, vec![String::from("alpha"), String::from("beta")]);
//! }
//! ```
//!
//! Set `REGRESS_CANONIZE=1` to accept changed values as the new canonical ones.

pub use crate::comparator::{ApproxComparator, Comparator, EqComparator, FnComparator, Mismatch, UnorderedComparator};
pub use crate::config::{CanonizeArgs, RegressConfig};
pub use crate::context::{RegressContext, TestContext};
pub use crate::error::{RegressError, RegressResult};
pub use crate::file_type::{ExtensionHint, FileType};
pub use crate::fixture::{CheckOutcome, Regress, RegressFixture};
pub use crate::policy::{CanonizePolicy, TerminalInteraction, UserInteraction};
pub use crate::report::RegressTestResult;
pub use crate::serializer::{BytesSerializer, JsonSerializer, RegressSerializer, TextSerializer, YamlSerializer};
pub use crate::storage::{FsStorage, MemoryStorage, RegressStorage};

pub mod cli;
pub mod comparator;
pub mod config;
pub mod context;
pub mod error;
pub mod file_type;
pub mod fixture;
pub mod policy;
pub mod report;
pub mod serializer;
pub mod storage;
