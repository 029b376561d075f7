//! Atomic record file operations.
//!
//! Provides a thin layer that reads, replaces and removes a single record
//! file. Every call opens and closes its own handles.

use crate::codec::RecordCodec;
use std::fs;
use std::io::{ErrorKind, Write as IoWrite};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use xaelai_core::{Result, RunRecord, XaelaiError};

/// A handle to a single run record file.
///
/// Provides:
/// - **Atomicity**: Writes are all-or-nothing via a private tmp file + atomic rename
/// - **Consistency**: Content is decoded through the configured codec on load
/// - **Durability**: Explicit fsync before rename
///
/// There is no locking; concurrent writers resolve as last-writer-wins and
/// never observe each other's partial output.
pub struct AtomicRecordFile {
    path: PathBuf,
    codec: RecordCodec,
}

impl AtomicRecordFile {
    /// Creates a new handle. No IO happens here.
    pub fn new(path: PathBuf, codec: RecordCodec) -> Self {
        Self { path, codec }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads and decodes the record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(RunRecord))`: Successfully loaded and decoded
    /// - `Ok(None)`: File doesn't exist
    /// - `Err(CorruptRecord)`: File exists but could not be decoded
    /// - `Err(Io)`: File could not be read
    pub fn load(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(XaelaiError::corrupt(
                    run_id,
                    self.codec.format_name(),
                    "file is not valid UTF-8",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        self.codec.deserialize(run_id, &content).map(Some)
    }

    /// Replaces the file with the encoded record.
    ///
    /// The content is staged in a uniquely named temporary file next to the
    /// target and renamed over it, so concurrent saves never share a temp
    /// file and readers only ever see a complete record.
    pub fn save(&self, record: &RunRecord) -> Result<()> {
        let content = self.codec.serialize(record)?;

        let staged = stage_in(self.parent()?, content.as_bytes())?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Writes the record only if the file does not exist yet.
    ///
    /// The content is staged first and then linked into place without
    /// clobbering, so the target never exists in a partially written state.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: File was created
    /// - `Ok(false)`: File already existed and was left untouched
    pub fn create_new(&self, record: &RunRecord) -> Result<bool> {
        let content = self.codec.serialize(record)?;

        let staged = stage_in(self.parent()?, content.as_bytes())?;
        match staged.persist_noclobber(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error.into()),
        }
    }

    /// Removes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: File was removed
    /// - `Ok(false)`: File did not exist
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn parent(&self) -> Result<&Path> {
        self.path
            .parent()
            .ok_or_else(|| XaelaiError::io("Path has no parent directory"))
    }
}

/// Writes `bytes` to a fresh hidden temp file in `dir` and fsyncs it.
///
/// The file is removed when the returned handle is dropped without being
/// persisted.
pub(crate) fn stage_in(dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    Ok(staged)
}
