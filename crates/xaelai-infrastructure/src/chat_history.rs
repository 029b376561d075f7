//! Named chat-history sessions.
//!
//! A session owns the name of one conversation file and is confined to a
//! single directory. It computes names and moves the file on rename; it never
//! keeps a file handle open between calls. Writing the record itself is the
//! store's job (see [`ChatHistorySession::store`]).

use crate::codec::RecordCodec;
use crate::file_run_store::FileRunStore;
use crate::storage::stage_in;
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use xaelai_core::{NameGenerator, Result, XaelaiError};

/// The in-memory handle for one named conversation.
///
/// The file name is `<label>_<YYYY-MM-DD_HH-MM-SS>.<ext>`. The timestamp is
/// fixed at creation; renaming only changes the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHistorySession {
    root_dir: PathBuf,
    display_name: String,
    created: NaiveDateTime,
    codec: RecordCodec,
    file_name: String,
}

impl ChatHistorySession {
    /// Creates a session for `label`, stamped with the current local time.
    ///
    /// See [`create_at`](Self::create_at).
    pub fn create(root_dir: impl AsRef<Path>, label: &str, codec: RecordCodec) -> Result<Self> {
        Self::create_at(root_dir, label, codec, Local::now().naive_local())
    }

    /// Creates a session for `label` stamped with `when`.
    ///
    /// Ensures `root_dir` exists (creating parents). No record file is
    /// written.
    ///
    /// # Errors
    ///
    /// - `PathEscape` if the name would resolve outside `root_dir`
    /// - `InvalidName` if the label is otherwise unusable
    /// - `Io` if the root cannot be created
    pub fn create_at(
        root_dir: impl AsRef<Path>,
        label: &str,
        codec: RecordCodec,
        when: NaiveDateTime,
    ) -> Result<Self> {
        let root_dir = prepare_root(root_dir.as_ref())?;
        let created = NameGenerator::truncate(when);

        let file_name = NameGenerator::compose(label, created, codec.extension());
        resolve_within(&root_dir, &file_name)?;
        NameGenerator::validate_label(label)?;

        tracing::info!("Created chat history session '{}'", file_name);

        Ok(Self {
            root_dir,
            display_name: label.to_string(),
            created,
            codec,
            file_name,
        })
    }

    /// Reopens the session whose file is `file_name` inside `root_dir`.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if the name was not produced by [`NameGenerator`]
    /// - `PathEscape` if it points outside `root_dir`
    /// - `RecordNotFound` if the file (or the root) does not exist
    pub fn open(root_dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        let root_dir = match fs::canonicalize(root_dir.as_ref()) {
            Ok(root) => root,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(XaelaiError::not_found(file_name));
            }
            Err(e) => return Err(e.into()),
        };

        let path = resolve_within(&root_dir, file_name)?;
        let parsed = NameGenerator::parse(file_name)?;
        let codec = RecordCodec::from_extension(&parsed.extension).ok_or_else(|| {
            XaelaiError::invalid_name(file_name, "unsupported record extension")
        })?;

        if !path.is_file() {
            return Err(XaelaiError::not_found(file_name));
        }

        Ok(Self {
            root_dir,
            display_name: parsed.label,
            created: parsed.created,
            codec,
            file_name: file_name.to_string(),
        })
    }

    /// Lists session file names in `root_dir` for `codec`, newest first.
    ///
    /// Files whose names were not generated by [`NameGenerator`] are ignored.
    /// A missing directory yields an empty list.
    pub fn list(root_dir: impl AsRef<Path>, codec: RecordCodec) -> Result<Vec<String>> {
        let entries = match fs::read_dir(root_dir.as_ref()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            match NameGenerator::parse(&file_name) {
                Ok(parsed) if RecordCodec::from_extension(&parsed.extension) == Some(codec) => {
                    sessions.push((parsed.created, file_name));
                }
                _ => {}
            }
        }

        sessions.sort_by(|a, b| b.cmp(a));
        Ok(sessions.into_iter().map(|(_, name)| name).collect())
    }

    /// Renames the session, keeping its original timestamp.
    ///
    /// Steps: compute the new name, verify both paths stay inside the root,
    /// move the file, then update the in-memory name. Any failure leaves
    /// both the file and this handle unchanged.
    ///
    /// # Errors
    ///
    /// - `PathEscape` if either path would leave the root (nothing is moved)
    /// - `InvalidName` if `new_label` is otherwise unusable
    /// - `RecordNotFound` if the backing file no longer exists
    /// - `AlreadyExists` if another session already uses the new name
    pub fn rename(&mut self, new_label: &str) -> Result<()> {
        let old_path = resolve_within(&self.root_dir, &self.file_name)?;
        let new_file_name = NameGenerator::compose(new_label, self.created, self.codec.extension());
        let new_path = resolve_within(&self.root_dir, &new_file_name)?;
        NameGenerator::validate_label(new_label)?;

        if !old_path.is_file() {
            return Err(XaelaiError::not_found(self.record_id()));
        }
        if new_file_name == self.file_name {
            return Ok(());
        }
        if new_path.exists() {
            return Err(XaelaiError::already_exists(strip_extension(&new_file_name)));
        }

        move_file(&old_path, &new_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => XaelaiError::not_found(self.record_id()),
            ErrorKind::AlreadyExists => {
                XaelaiError::already_exists(strip_extension(&new_file_name))
            }
            _ => e.into(),
        })?;

        tracing::info!(
            "Renamed chat history session '{}' -> '{}'",
            self.file_name,
            new_file_name
        );

        self.display_name = new_label.to_string();
        self.file_name = new_file_name;
        Ok(())
    }

    /// Removes the backing file. Removing a missing file is not an error.
    pub fn delete(&self) -> Result<()> {
        let path = resolve_within(&self.root_dir, &self.file_name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted chat history session '{}'", self.file_name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns a store over this session's directory and format, in which
    /// the session's record lives under [`record_id`](Self::record_id).
    pub fn store(&self) -> Result<FileRunStore> {
        FileRunStore::new(&self.root_dir, self.codec)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The file name without extension; the run id of the backing record.
    pub fn record_id(&self) -> &str {
        strip_extension(&self.file_name)
    }

    pub fn created(&self) -> NaiveDateTime {
        self.created
    }

    pub fn codec(&self) -> RecordCodec {
        self.codec
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn path(&self) -> PathBuf {
        self.root_dir.join(&self.file_name)
    }
}

fn strip_extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

/// Creates the root if needed and returns its canonical form.
fn prepare_root(root_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(root_dir).map_err(|e| {
        tracing::error!("Failed to create chat history directory {:?}: {}", root_dir, e);
        XaelaiError::from(e)
    })?;
    Ok(fs::canonicalize(root_dir)?)
}

/// Joins `file_name` onto `root_dir` and checks the result stays inside it.
///
/// The name must be a single plain path component. If something already
/// exists at the target, symlinks are resolved and the real location is
/// checked as well.
fn resolve_within(root_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let mut components = Path::new(file_name).components();
    let is_single_component = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    let candidate = root_dir.join(file_name);
    if !is_single_component || candidate.parent() != Some(root_dir) {
        tracing::warn!("Rejected chat history name outside storage root");
        return Err(XaelaiError::path_escape(file_name));
    }

    match fs::canonicalize(&candidate) {
        Ok(real) if !real.starts_with(root_dir) => {
            tracing::warn!("Rejected chat history file resolving outside storage root");
            Err(XaelaiError::path_escape(file_name))
        }
        _ => Ok(candidate),
    }
}

/// Moves `from` to `to` without ever replacing an existing `to`.
///
/// Links the new name and then unlinks the old one. Where hard links are not
/// available (e.g. across file systems) this falls back to
/// [`copy_then_remove`].
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) if matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::NotFound) => Err(e),
        Err(e) => {
            tracing::debug!("hard link failed ({}), falling back to copy", e);
            copy_then_remove(from, to)
        }
    }
}

/// Copies `from` into a new file at `to`, then removes `from`.
///
/// Fails with `AlreadyExists` if `to` exists, leaving both files untouched.
/// The copy is on disk before the source is removed; if the source cannot be
/// removed, the copy is rolled back.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let bytes = fs::read(from)?;
    let dir = to
        .parent()
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "destination has no parent"))?;
    stage_in(dir, &bytes)?
        .persist_noclobber(to)
        .map_err(|e| e.error)?;

    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }

    Ok(())
}
