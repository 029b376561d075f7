//! File-backed RunStore implementation

use crate::codec::RecordCodec;
use crate::storage::AtomicRecordFile;
use std::fs;
use std::path::{Path, PathBuf};
use xaelai_core::naming::validate_run_id;
use xaelai_core::{Result, RunListing, RunRecord, RunStore, SkippedRecord, XaelaiError};

/// A store that keeps one file per run.
///
/// Directory structure:
/// ```text
/// root_dir/
/// ├── run-id-1.yaml
/// └── run-id-2.yaml
/// ```
///
/// The file extension follows the configured codec. Files with any other
/// extension, hidden files and temporary files are ignored.
#[derive(Debug)]
pub struct FileRunStore {
    root_dir: PathBuf,
    codec: RecordCodec,
}

impl FileRunStore {
    /// Creates a new `FileRunStore` rooted at `root_dir`.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created. This is fatal for
    /// the caller; no record operation can succeed without a root.
    pub fn new(root_dir: impl AsRef<Path>, codec: RecordCodec) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();

        fs::create_dir_all(&root_dir).map_err(|e| {
            tracing::error!("Failed to create run storage root {:?}: {}", root_dir, e);
            XaelaiError::from(e)
        })?;

        Ok(Self { root_dir, codec })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn codec(&self) -> RecordCodec {
        self.codec
    }

    /// Returns the file path for a given run ID.
    pub fn record_path(&self, run_id: &str) -> Result<PathBuf> {
        validate_run_id(run_id)?;
        Ok(self
            .root_dir
            .join(format!("{}.{}", run_id, self.codec.extension())))
    }

    fn record_file(&self, run_id: &str) -> Result<AtomicRecordFile> {
        Ok(AtomicRecordFile::new(self.record_path(run_id)?, self.codec))
    }

    /// Lists run ids from file stems, without reading any record.
    fn scan_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file()
                || path.extension().and_then(|s| s.to_str()) != Some(self.codec.extension())
            {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::debug!("Ignoring non UTF-8 file name in run storage: {:?}", path);
                continue;
            };

            if validate_run_id(stem).is_ok() {
                ids.push(stem.to_string());
            }
        }

        Ok(ids)
    }

    /// Reads a record and keys it by its file stem.
    ///
    /// The file location is authoritative: a file moved by a chat-history
    /// rename still carries the old id inside.
    fn load(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let Some(mut record) = self.record_file(run_id)?.load(run_id)? else {
            return Ok(None);
        };

        if record.run_id != run_id {
            tracing::debug!(
                "Run file '{}' stores run_id '{}'; using the file name",
                run_id,
                record.run_id
            );
            record.run_id = run_id.to_string();
        }

        Ok(Some(record))
    }
}

impl RunStore for FileRunStore {
    fn create(&self, run_id: &str) -> Result<()> {
        let file = self.record_file(run_id)?;

        if file.create_new(&RunRecord::new(run_id))? {
            tracing::debug!("Created placeholder run '{}'", run_id);
        }

        Ok(())
    }

    fn create_new(&self, record: &RunRecord) -> Result<()> {
        let file = self.record_file(&record.run_id)?;

        if !file.create_new(record)? {
            return Err(XaelaiError::already_exists(&record.run_id));
        }

        tracing::debug!("Created run '{}'", record.run_id);
        Ok(())
    }

    fn read(&self, run_id: &str) -> Result<Option<RunRecord>> {
        self.load(run_id)
    }

    fn upsert(&self, record: &RunRecord) -> Result<()> {
        self.record_file(&record.run_id)?.save(record)?;
        tracing::debug!(
            "Saved run '{}' ({} messages)",
            record.run_id,
            record.messages.len()
        );
        Ok(())
    }

    fn delete(&self, run_id: &str) -> Result<()> {
        if self.record_file(run_id)?.remove()? {
            tracing::debug!("Deleted run '{}'", run_id);
        }
        Ok(())
    }

    fn list_ids(&self, user_id: Option<&str>) -> Result<Vec<String>> {
        let ids = self.scan_ids()?;

        let Some(user_id) = user_id else {
            return Ok(ids);
        };

        let mut owned = Vec::new();
        for id in ids {
            match self.load(&id) {
                Ok(Some(record)) if record.is_owned_by(user_id) => owned.push(id),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping run '{}' while filtering by user: {}", id, e),
            }
        }

        Ok(owned)
    }

    fn list_all(&self) -> Result<RunListing> {
        let mut listing = RunListing::default();

        for id in self.scan_ids()? {
            match self.load(&id) {
                Ok(Some(record)) => listing.records.push(record),
                // Removed between scan and read.
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to load run '{}': {}", id, e);
                    listing.skipped.push(SkippedRecord {
                        run_id: id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use xaelai_core::{MessageRole, RunMessage};

    fn create_test_record(id: &str) -> RunRecord {
        RunRecord::new(id)
            .with_name(format!("Test Run {}", id))
            .with_messages(vec![
                RunMessage::user("Hello"),
                RunMessage::assistant("Hi there!"),
            ])
    }

    #[test]
    fn test_upsert_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        let record = create_test_record("test-run-1");
        store.upsert(&record).unwrap();

        let loaded = store.read("test-run-1").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(temp_dir.path().join("test-run-1.yaml").exists());
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Json).unwrap();

        assert!(store.read("nonexistent-run").unwrap().is_none());
    }

    #[test]
    fn test_new_creates_nested_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("alice").join("runs");
        let store = FileRunStore::new(&root, RecordCodec::Yaml).unwrap();

        assert!(root.is_dir());
        assert_eq!(store.root_dir(), root.as_path());
    }

    #[test]
    fn test_new_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = FileRunStore::new(blocker.join("runs"), RecordCodec::Yaml);
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_create_is_idempotent_touch() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        store.create("run-1").unwrap();
        let placeholder = store.read("run-1").unwrap().unwrap();
        assert!(placeholder.messages.is_empty());

        let mut record = placeholder.clone();
        record.push_message(MessageRole::User, "keep me");
        store.upsert(&record).unwrap();

        // A second create must not reset the record.
        store.create("run-1").unwrap();
        assert_eq!(store.read("run-1").unwrap().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_create_new_rejects_collision() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Json).unwrap();

        store.create_new(&create_test_record("run-1")).unwrap();
        let err = store
            .create_new(&create_test_record("run-1").with_name("other"))
            .unwrap_err();

        assert!(err.is_already_exists());
        assert_eq!(store.read("run-1").unwrap().unwrap().run_name, "Test Run run-1");
    }

    #[test]
    fn test_upsert_with_shadowing_extra_key_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();
        let record = create_test_record("run-1");
        store.upsert(&record).unwrap();
        let before = fs::read(temp_dir.path().join("run-1.yaml")).unwrap();

        let mut shadowed = record.clone();
        shadowed
            .extra
            .insert("run_name".to_string(), serde_json::json!("shadow"));
        assert!(store.upsert(&shadowed).unwrap_err().is_invalid_record());

        let mut shadowed = record.clone();
        shadowed.messages[0]
            .extra
            .insert("role".to_string(), serde_json::json!("system"));
        assert!(store.upsert(&shadowed).unwrap_err().is_invalid_record());

        assert_eq!(fs::read(temp_dir.path().join("run-1.yaml")).unwrap(), before);
        assert_eq!(store.read("run-1").unwrap().unwrap(), record);
    }

    #[test]
    fn test_upsert_overwrites_whole_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        store.upsert(&create_test_record("run-1")).unwrap();
        store
            .upsert(&RunRecord::new("run-1").with_name("replaced"))
            .unwrap();

        let loaded = store.read("run-1").unwrap().unwrap();
        assert_eq!(loaded.run_name, "replaced");
        assert!(loaded.messages.is_empty());
    }

    #[test]
    fn test_delete_twice() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        store.upsert(&create_test_record("run-to-delete")).unwrap();
        store.delete("run-to-delete").unwrap();
        store.delete("run-to-delete").unwrap();

        assert!(store.read("run-to-delete").unwrap().is_none());
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path().join("runs"), RecordCodec::Yaml).unwrap();

        for id in ["", "../escape", "a/b", ".."] {
            assert!(store.read(id).unwrap_err().is_invalid_name());
            assert!(store.delete(id).unwrap_err().is_invalid_name());
            assert!(store.upsert(&RunRecord::new(id)).unwrap_err().is_invalid_name());
        }
        assert!(!temp_dir.path().join("escape.yaml").exists());
    }

    #[test]
    fn test_list_ids_ignores_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        store.upsert(&create_test_record("run-1")).unwrap();
        store.upsert(&create_test_record("run-2")).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(temp_dir.path().join("run-3.json"), "{}").unwrap();
        fs::write(temp_dir.path().join(".run-4.yaml.tmp"), "partial").unwrap();
        fs::create_dir(temp_dir.path().join("dir.yaml")).unwrap();

        let mut ids = store.list_ids(None).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["run-1".to_string(), "run-2".to_string()]);
    }

    #[test]
    fn test_list_ids_filtered_by_user() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Json).unwrap();

        store.upsert(&create_test_record("a").with_user("alice")).unwrap();
        store.upsert(&create_test_record("b").with_user("bob")).unwrap();
        store.upsert(&create_test_record("c")).unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{").unwrap();

        assert_eq!(store.list_ids(Some("alice")).unwrap(), vec!["a".to_string()]);
        assert_eq!(store.list_ids(None).unwrap().len(), 4);
    }

    #[test]
    fn test_list_all_skips_corrupt_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        store.upsert(&create_test_record("good-1")).unwrap();
        store.upsert(&create_test_record("good-2")).unwrap();
        fs::write(temp_dir.path().join("bad.yaml"), "run_id: [oops").unwrap();

        let listing = store.list_all().unwrap();

        let mut ids: Vec<_> = listing.records.iter().map(|r| r.run_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["good-1", "good-2"]);
        assert_eq!(listing.skipped.len(), 1);
        assert_eq!(listing.skipped[0].run_id, "bad");
        assert!(!listing.is_complete());
    }

    #[test]
    fn test_read_corrupt_record_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Json).unwrap();
        fs::write(temp_dir.path().join("bad.json"), "not json").unwrap();

        assert!(store.read("bad").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_read_uses_file_stem_as_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRunStore::new(temp_dir.path(), RecordCodec::Yaml).unwrap();

        store.upsert(&create_test_record("old-name")).unwrap();
        fs::rename(
            temp_dir.path().join("old-name.yaml"),
            temp_dir.path().join("new-name.yaml"),
        )
        .unwrap();

        let loaded = store.read("new-name").unwrap().unwrap();
        assert_eq!(loaded.run_id, "new-name");
        assert_eq!(loaded.run_name, "Test Run old-name");
    }
}
