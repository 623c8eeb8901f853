//! # Regress Fixtures
//!
//! [`Regress`] is the shared, run-wide half of the workflow: storage,
//! canonize policy, configuration, and the registry of claimed keys.
//! [`RegressFixture`] pairs it with one test's [`RegressContext`].
//!
//! A check goes through these steps:
//! 1. **Naming**: the context derives the storage key.
//! 2. **Lookup**: the canonical artifact is read, if any.
//! 3. **First run**: an absent artifact is recorded (or the policy is asked
//!    when recording missing values is disabled).
//! 4. **Comparison**: the canonical artifact is loaded and compared.
//! 5. **Canonization**: on mismatch the policy decides between overwriting
//!    and failing.

use crate::comparator::{Comparator, EqComparator, Mismatch};
use crate::config::RegressConfig;
use crate::context::{RegressContext, TestContext};
use crate::error::{RegressError, RegressResult};
use crate::policy::CanonizePolicy;
use crate::report::RegressTestResult;
use crate::serializer::{BytesSerializer, JsonSerializer, RegressSerializer, TextSerializer};
use crate::storage::{FsStorage, RegressStorage};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::{Entry, HashMap};
use std::fmt::Debug;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// How a successful check ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No canonical value existed; the live value was stored.
    Recorded,
    /// The live value matched the canonical value.
    Matched,
    /// The live value differed and the policy accepted it.
    Canonized,
}

// =============================================================================
// SHARED STORE
// =============================================================================

/// Shared top-level store for a test run.
pub struct Regress {
    storage: Box<dyn RegressStorage>,
    policy: CanonizePolicy,
    config: RegressConfig,
    claimed: Mutex<HashMap<String, String>>,
}

static SHARED: OnceCell<Regress> = OnceCell::new();

impl Regress {
    pub fn new(storage: impl RegressStorage + 'static, policy: CanonizePolicy, config: RegressConfig) -> Self {
        Self {
            storage: Box::new(storage),
            policy,
            config,
            claimed: Mutex::new(HashMap::new()),
        }
    }

    /// Filesystem store at `config.root` with the policy the config selects.
    pub fn from_config(config: RegressConfig) -> RegressResult<Self> {
        let storage = FsStorage::new(&config.root);
        storage.ensure_exists(false)?;
        let policy = CanonizePolicy::from_config(&config);
        Ok(Self::new(storage, policy, config))
    }

    /// The process-wide store, configured from the environment on first use.
    pub fn shared() -> RegressResult<&'static Regress> {
        SHARED.get_or_try_init(|| Regress::from_config(RegressConfig::from_env()))
    }

    pub fn config(&self) -> &RegressConfig {
        &self.config
    }

    pub fn policy(&self) -> &CanonizePolicy {
        &self.policy
    }

    pub fn storage(&self) -> &dyn RegressStorage {
        self.storage.as_ref()
    }

    /// Binds this store to one test.
    pub fn fixture<C: RegressContext>(&self, context: C) -> RegressFixture<'_, C> {
        RegressFixture::new(self, context)
    }

    /// Records that `node_id` owns `key` for the rest of the run.
    fn claim(&self, key: &str, node_id: &str) -> RegressResult<()> {
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match claimed.entry(key.to_string()) {
            Entry::Occupied(owner) if owner.get() != node_id => Err(RegressError::KeyCollision {
                key: key.to_string(),
                first: owner.get().clone(),
                second: node_id.to_string(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(node_id.to_string());
                Ok(())
            }
        }
    }

    fn read(&self, key: &str) -> RegressResult<Option<Vec<u8>>> {
        let Some(mut reader) = self.storage.open_read(key)? else {
            return Ok(None);
        };
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| RegressError::storage(key, e))?;
        Ok(Some(bytes))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> RegressResult<()> {
        let mut writer = self.storage.open_write(key)?;
        writer
            .write_all(bytes)
            .and_then(|_| writer.flush())
            .map_err(|e| RegressError::storage(key, e))
    }
}

impl Debug for Regress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regress")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PER-TEST FIXTURE
// =============================================================================

/// One test's view of the shared store.
pub struct RegressFixture<'a, C: RegressContext> {
    regress: &'a Regress,
    context: C,
}

impl RegressFixture<'static, TestContext> {
    /// Fixture for the running test over the process-wide store.
    pub fn current() -> RegressResult<Self> {
        Ok(RegressFixture::new(Regress::shared()?, TestContext::current()?))
    }
}

impl<'a, C: RegressContext> RegressFixture<'a, C> {
    pub fn new(regress: &'a Regress, context: C) -> Self {
        Self { regress, context }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Checks `obj` as JSON under the test's default key.
    pub fn check<T>(&self, obj: &T) -> RegressResult<CheckOutcome>
    where
        T: Serialize + DeserializeOwned + PartialEq + Debug + 'static,
    {
        self.check_with(obj, &JsonSerializer::new(), None)
    }

    /// Checks text stored verbatim as `.txt`.
    pub fn check_text(&self, text: &str, suffix: Option<&str>) -> RegressResult<CheckOutcome> {
        self.check_with(&text.to_string(), &TextSerializer::new(), suffix)
    }

    /// Checks with an explicit serializer and the context's comparator.
    pub fn check_with<T, S>(&self, obj: &T, serializer: &S, suffix: Option<&str>) -> RegressResult<CheckOutcome>
    where
        T: PartialEq + Debug + 'static,
        S: RegressSerializer<T>,
    {
        let comparator = self
            .context
            .comparator::<T>()
            .unwrap_or_else(|| Box::new(EqComparator));
        self.check_by(obj, serializer, suffix, comparator.as_ref())
    }

    /// Checks with an explicit serializer and comparator.
    pub fn check_by<T, S>(
        &self,
        obj: &T,
        serializer: &S,
        suffix: Option<&str>,
        comparator: &dyn Comparator<T>,
    ) -> RegressResult<CheckOutcome>
    where
        S: RegressSerializer<T>,
    {
        let key = self.context.storage_name(serializer.file_type(), suffix);
        self.run(&key, obj, serializer, comparator)
    }

    /// Snapshots an existing file's bytes, keyed by its file name.
    pub fn check_file(&self, path: impl AsRef<Path>) -> RegressResult<CheckOutcome> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = self.context.storage_name_from_filename(&filename);
        let bytes = fs::read(path).map_err(|e| RegressError::storage(path.display().to_string(), e))?;
        self.run(&key, &bytes, &BytesSerializer::new(), &ContentComparator)
    }

    fn run<T, S>(&self, key: &str, obj: &T, serializer: &S, comparator: &dyn Comparator<T>) -> RegressResult<CheckOutcome>
    where
        S: RegressSerializer<T>,
    {
        self.regress.claim(key, self.context.node_id())?;

        let Some(stored) = self.regress.read(key)? else {
            return self.first_run(key, obj, serializer);
        };

        let canonical = serializer
            .load(&mut stored.as_slice())
            .map_err(|e| e.with_key(key))?;
        let failure = match comparator.compare(obj, &canonical) {
            Ok(()) => {
                debug!(key = %key, "canonical value matched");
                return Ok(CheckOutcome::Matched);
            }
            Err(failure) => failure,
        };

        let live = serializer.render(obj).map_err(|e| e.with_key(key))?;
        let result = RegressTestResult::new(
            key,
            live,
            Some(String::from_utf8_lossy(&stored).into_owned()),
            failure,
        );
        if self.regress.policy.ask_canonize(&self.context, &result) {
            self.store(key, obj, serializer)?;
            info!(key = %key, node_id = self.context.node_id(), "canonized new value");
            return Ok(CheckOutcome::Canonized);
        }

        warn!(key = %key, node_id = self.context.node_id(), "canonical value differs");
        let diff = if self.regress.config.use_colors {
            result.format_diff_colored()
        } else {
            result.format_diff()
        };
        Err(RegressError::Mismatch {
            key: key.to_string(),
            message: result.failure.message,
            diff,
        })
    }

    fn first_run<T, S>(&self, key: &str, obj: &T, serializer: &S) -> RegressResult<CheckOutcome>
    where
        S: RegressSerializer<T>,
    {
        if self.regress.config.record_missing {
            self.store(key, obj, serializer)?;
            info!(key = %key, node_id = self.context.node_id(), "recorded canonical value");
            return Ok(CheckOutcome::Recorded);
        }

        let live = serializer.render(obj).map_err(|e| e.with_key(key))?;
        let result = RegressTestResult::new(key, live, None, Mismatch::new("no canonical value recorded"));
        if self.regress.policy.ask_canonize(&self.context, &result) {
            self.store(key, obj, serializer)?;
            info!(key = %key, node_id = self.context.node_id(), "canonized missing value");
            return Ok(CheckOutcome::Canonized);
        }
        Err(RegressError::MissingCanonical { key: key.to_string() })
    }

    fn store<T, S>(&self, key: &str, obj: &T, serializer: &S) -> RegressResult<()>
    where
        S: RegressSerializer<T>,
    {
        let mut bytes = Vec::new();
        serializer.dump(obj, &mut bytes).map_err(|e| e.with_key(key))?;
        // An artifact that cannot be loaded back would fail every later run.
        serializer
            .load(&mut bytes.as_slice())
            .map_err(|e| e.with_key(key))?;
        self.regress.write(key, &bytes)
    }
}

/// Byte equality with a size summary instead of a byte dump.
struct ContentComparator;

impl Comparator<Vec<u8>> for ContentComparator {
    fn compare(&self, live: &Vec<u8>, canonical: &Vec<u8>) -> Result<(), Mismatch> {
        if live == canonical {
            return Ok(());
        }
        Err(Mismatch::new(format!(
            "file contents differ: live is {} bytes, canonical is {} bytes",
            live.len(),
            canonical.len()
        )))
    }
}

/// Checks a value against its canonical JSON and panics with a rendered
/// diagnostic on any failure.
///
/// ```rust,no_run
/// use regress::{assert_regress, RegressFixture};
///
/// let fixture = RegressFixture::current().unwrap();
/// assert_regress!(fixture, vec![1, 2, 3]);
/// assert_regress!(fixture, "hello".to_string(), "-greeting");
/// ```
#[macro_export]
macro_rules! assert_regress {
    ($fixture:expr, $value:expr $(,)?) => {
        if let Err(err) = $fixture.check(&$value) {
            panic!("{}", err.render());
        }
    };
    ($fixture:expr, $value:expr, $suffix:expr $(,)?) => {
        if let Err(err) = $fixture.check_with(
            &$value,
            &$crate::serializer::JsonSerializer::new(),
            Some($suffix),
        ) {
            panic!("{}", err.render());
        }
    };
}
