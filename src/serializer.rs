//! # Serializers
//!
//! A serializer turns a live object into the bytes of a canonical artifact
//! and back. For every object `o` the format can represent,
//! `load(dump(o))` compares equal to `o`.
//!
//! Malformed content is a [`RegressError::Serialize`], never a mismatch.

use crate::error::{RegressError, RegressResult};
use crate::file_type::FileType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use std::marker::PhantomData;
use tracing::debug;

pub trait RegressSerializer<T> {
    /// Hint used to derive the storage key's extension.
    fn file_type(&self) -> &FileType;

    fn load(&self, reader: &mut dyn Read) -> RegressResult<T>;

    fn dump(&self, obj: &T, writer: &mut dyn Write) -> RegressResult<()>;

    /// Serializes into an in-memory string, lossily for non-UTF-8 formats.
    /// Used to render diffs.
    fn render(&self, obj: &T) -> RegressResult<String> {
        let mut buf = Vec::new();
        self.dump(obj, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Pretty-printed JSON with a trailing newline.
pub struct JsonSerializer<T> {
    file_type: FileType,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    pub fn new() -> Self {
        Self::with_file_type(FileType::json())
    }

    pub fn with_file_type(file_type: FileType) -> Self {
        Self {
            file_type,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> RegressSerializer<T> for JsonSerializer<T> {
    fn file_type(&self) -> &FileType {
        &self.file_type
    }

    fn load(&self, reader: &mut dyn Read) -> RegressResult<T> {
        serde_json::from_reader(reader).map_err(|e| RegressError::serialize("json", e))
    }

    fn dump(&self, obj: &T, writer: &mut dyn Write) -> RegressResult<()> {
        serde_json::to_writer_pretty(&mut *writer, obj)
            .map_err(|e| RegressError::serialize("json", e))?;
        writer
            .write_all(b"\n")
            .map_err(|e| RegressError::serialize("json", e))?;
        debug!(mime = self.file_type.mime(), "dumped json");
        Ok(())
    }
}

// ============================================================================
// YAML
// ============================================================================

pub struct YamlSerializer<T> {
    file_type: FileType,
    _marker: PhantomData<fn() -> T>,
}

impl<T> YamlSerializer<T> {
    pub fn new() -> Self {
        Self {
            file_type: FileType::yaml(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for YamlSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> RegressSerializer<T> for YamlSerializer<T> {
    fn file_type(&self) -> &FileType {
        &self.file_type
    }

    fn load(&self, reader: &mut dyn Read) -> RegressResult<T> {
        serde_yaml::from_reader(reader).map_err(|e| RegressError::serialize("yaml", e))
    }

    fn dump(&self, obj: &T, writer: &mut dyn Write) -> RegressResult<()> {
        serde_yaml::to_writer(writer, obj).map_err(|e| RegressError::serialize("yaml", e))
    }
}

// ============================================================================
// TEXT AND RAW BYTES
// ============================================================================

/// UTF-8 text stored as-is.
pub struct TextSerializer {
    file_type: FileType,
}

impl TextSerializer {
    pub fn new() -> Self {
        Self::with_file_type(FileType::text())
    }

    pub fn with_file_type(file_type: FileType) -> Self {
        Self { file_type }
    }
}

impl Default for TextSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressSerializer<String> for TextSerializer {
    fn file_type(&self) -> &FileType {
        &self.file_type
    }

    fn load(&self, reader: &mut dyn Read) -> RegressResult<String> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| RegressError::serialize("text", e))?;
        Ok(text)
    }

    fn dump(&self, obj: &String, writer: &mut dyn Write) -> RegressResult<()> {
        writer
            .write_all(obj.as_bytes())
            .map_err(|e| RegressError::serialize("text", e))
    }
}

/// Opaque bytes stored as-is.
pub struct BytesSerializer {
    file_type: FileType,
}

impl BytesSerializer {
    pub fn new() -> Self {
        Self::with_file_type(FileType::bytes())
    }

    pub fn with_file_type(file_type: FileType) -> Self {
        Self { file_type }
    }
}

impl Default for BytesSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressSerializer<Vec<u8>> for BytesSerializer {
    fn file_type(&self) -> &FileType {
        &self.file_type
    }

    fn load(&self, reader: &mut dyn Read) -> RegressResult<Vec<u8>> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| RegressError::serialize("bytes", e))?;
        Ok(bytes)
    }

    fn dump(&self, obj: &Vec<u8>, writer: &mut dyn Write) -> RegressResult<()> {
        writer
            .write_all(obj)
            .map_err(|e| RegressError::serialize("bytes", e))
    }
}
