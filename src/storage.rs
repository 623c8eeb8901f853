//! # Canonical Storage
//!
//! A storage backend reads and writes canonical artifacts by key.
//!
//! - An absent artifact is `Ok(None)` from [`RegressStorage::open_read`],
//!   never an error. Every other I/O failure is [`RegressError::Storage`].
//! - Keys are single path components; anything else is rejected with
//!   [`RegressError::InvalidKey`] before touching the backend.
//! - Readers and writers are plain owned handles, released when dropped.
//! - A filesystem writer stages bytes in a sibling temp file and renames it
//!   over the artifact on flush, so a failed write never leaves a partial
//!   artifact behind.

use crate::error::{RegressError, RegressResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

pub trait RegressStorage: Send + Sync {
    /// Opens the artifact for `key`, or `None` if nothing is stored yet.
    fn open_read(&self, key: &str) -> RegressResult<Option<Box<dyn Read>>>;

    /// Opens the artifact for `key` for writing. The new contents replace
    /// the old ones once the writer is flushed.
    fn open_write(&self, key: &str) -> RegressResult<Box<dyn Write>>;

    /// Deletes the artifact for `key`. Returns whether it existed.
    fn remove(&self, key: &str) -> RegressResult<bool>;

    /// All stored keys, sorted.
    fn keys(&self) -> RegressResult<Vec<String>>;
}

/// Rejects keys that are not a single, plain path component.
pub fn validate_key(key: &str) -> RegressResult<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key == "." || key == ".." {
        "key is a relative directory reference"
    } else if key.contains(['/', '\\']) {
        "key contains a path separator"
    } else if key.contains('\0') {
        "key contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(RegressError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

// ============================================================================
// FILESYSTEM STORAGE
// ============================================================================

/// Prefix of in-flight temp files, never reported as keys.
const PARTIAL_PREFIX: &str = ".regress-";

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory, wiping its contents first when `clear`.
    pub fn ensure_exists(&self, clear: bool) -> RegressResult<()> {
        let root_name = self.root.display().to_string();
        if clear && self.root.exists() {
            info!(root = %root_name, "clearing canonical storage");
            fs::remove_dir_all(&self.root).map_err(|e| RegressError::storage(&root_name, e))?;
        }
        fs::create_dir_all(&self.root).map_err(|e| RegressError::storage(root_name, e))
    }

    /// Path of the artifact for `key`.
    pub fn path_for(&self, key: &str) -> RegressResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl RegressStorage for FsStorage {
    fn open_read(&self, key: &str) -> RegressResult<Option<Box<dyn Read>>> {
        let path = self.path_for(key)?;
        match File::open(&path) {
            Ok(file) => {
                debug!(path = %path.display(), "opened canonical artifact");
                Ok(Some(Box::new(BufReader::new(file))))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegressError::storage(key, e)),
        }
    }

    fn open_write(&self, key: &str) -> RegressResult<Box<dyn Write>> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|e| RegressError::storage(key, e))?;
        let staged = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| RegressError::storage(key, e))?;
        debug!(path = %path.display(), "writing canonical artifact");
        Ok(Box::new(StagedWriter {
            path,
            pending: Some(BufWriter::new(staged)),
        }))
    }

    fn remove(&self, key: &str) -> RegressResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RegressError::storage(key, e)),
        }
    }

    fn keys(&self) -> RegressResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let root_name = self.root.display().to_string();
                RegressError::storage(root_name, io::Error::new(io::ErrorKind::Other, e))
            })?;
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_file() && !name.starts_with(PARTIAL_PREFIX) {
                keys.push(name.into_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Writes into a temp file and renames it over `path` on flush. Dropping it
/// unflushed deletes the temp file and leaves the artifact untouched.
struct StagedWriter {
    path: PathBuf,
    pending: Option<BufWriter<NamedTempFile>>,
}

impl Write for StagedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self.pending.as_mut() {
            Some(writer) => writer.write(data),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "artifact already committed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(writer) = self.pending.take() else {
            return Ok(());
        };
        let staged = writer.into_inner().map_err(|e| e.into_error())?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY STORAGE
// ============================================================================

type Entries = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// Process-local storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Entries,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        lock(&self.entries).insert(key.into(), bytes.into());
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(entries: &Entries) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RegressStorage for MemoryStorage {
    fn open_read(&self, key: &str) -> RegressResult<Option<Box<dyn Read>>> {
        validate_key(key)?;
        Ok(self
            .get(key)
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read>))
    }

    fn open_write(&self, key: &str) -> RegressResult<Box<dyn Write>> {
        validate_key(key)?;
        Ok(Box::new(MemoryWriter {
            key: key.to_string(),
            buf: Vec::new(),
            entries: Arc::clone(&self.entries),
        }))
    }

    fn remove(&self, key: &str) -> RegressResult<bool> {
        validate_key(key)?;
        Ok(lock(&self.entries).remove(key).is_some())
    }

    fn keys(&self) -> RegressResult<Vec<String>> {
        Ok(lock(&self.entries).keys().cloned().collect())
    }
}

/// Buffers writes and commits them to the shared map on flush and on drop.
struct MemoryWriter {
    key: String,
    buf: Vec<u8>,
    entries: Entries,
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.entries).insert(self.key.clone(), self.buf.clone());
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        lock(&self.entries).insert(self.key.clone(), std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(storage: &dyn RegressStorage, key: &str) -> Option<Vec<u8>> {
        let mut reader = storage.open_read(key).unwrap()?;
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        Some(out)
    }

    fn write_all(storage: &dyn RegressStorage, key: &str, bytes: &[u8]) {
        let mut writer = storage.open_write(key).unwrap();
        writer.write_all(bytes).unwrap();
        writer.flush().unwrap();
    }

    #[test]
    fn key_validation() {
        assert!(validate_key("suite__case.json").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "a\0b"] {
            assert!(
                matches!(validate_key(bad), Err(RegressError::InvalidKey { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn fs_absent_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(storage.open_read("missing.json").unwrap().is_none());
        assert!(!storage.remove("missing.json").unwrap());
    }

    #[test]
    fn fs_write_truncates_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().join("canon"));
        write_all(&storage, "k.txt", b"a longer first value");
        write_all(&storage, "k.txt", b"short");
        assert_eq!(read_all(&storage, "k.txt").as_deref(), Some(&b"short"[..]));
        assert_eq!(storage.keys().unwrap(), vec!["k.txt".to_string()]);
    }

    #[test]
    fn fs_commit_over_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        fs::create_dir(dir.path().join("dir_key")).unwrap();
        let mut writer = storage.open_write("dir_key").unwrap();
        writer.write_all(b"x").unwrap();
        assert!(writer.flush().is_err());
        drop(writer);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn fs_unflushed_write_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        write_all(&storage, "k.json", b"[1]\n");
        {
            let mut writer = storage.open_write("k.json").unwrap();
            writer.write_all(b"[2").unwrap();
            assert_eq!(read_all(&storage, "k.json").as_deref(), Some(&b"[1]\n"[..]));
        }
        assert_eq!(read_all(&storage, "k.json").as_deref(), Some(&b"[1]\n"[..]));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn fs_write_after_commit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let mut writer = storage.open_write("k.txt").unwrap();
        writer.write_all(b"a").unwrap();
        writer.flush().unwrap();
        writer.flush().unwrap();
        assert!(writer.write_all(b"b").is_err());
        assert_eq!(read_all(&storage, "k.txt").as_deref(), Some(&b"a"[..]));
    }

    #[test]
    fn fs_ensure_exists_clears() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().join("canon"));
        storage.ensure_exists(false).unwrap();
        write_all(&storage, "old.json", b"{}");
        storage.ensure_exists(false).unwrap();
        assert_eq!(storage.keys().unwrap().len(), 1);
        storage.ensure_exists(true).unwrap();
        assert!(storage.keys().unwrap().is_empty());
        assert!(storage.root().is_dir());
    }

    #[test]
    fn memory_writer_commits_on_drop() {
        let storage = MemoryStorage::new();
        {
            let mut writer = storage.open_write("k").unwrap();
            writer.write_all(b"abc").unwrap();
        }
        assert_eq!(storage.get("k").as_deref(), Some(&b"abc"[..]));
        let shared = storage.clone();
        assert!(shared.remove("k").unwrap());
        assert!(storage.is_empty());
    }

    #[test]
    fn memory_rejects_bad_keys() {
        let storage = MemoryStorage::new();
        assert!(storage.open_read("../escape").is_err());
    }
}
