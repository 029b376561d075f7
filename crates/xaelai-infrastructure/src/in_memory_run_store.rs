//! In-memory RunStore implementation.
//!
//! Nothing survives the process. Useful for ephemeral sessions and as a
//! stand-in for `FileRunStore` in caller tests.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use xaelai_core::naming::validate_run_id;
use xaelai_core::{Result, RunListing, RunRecord, RunStore, XaelaiError};

#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: RwLock<BTreeMap<String, RunRecord>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, RunRecord>>> {
        self.runs
            .read()
            .map_err(|_| XaelaiError::internal("run store lock poisoned"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, RunRecord>>> {
        self.runs
            .write()
            .map_err(|_| XaelaiError::internal("run store lock poisoned"))
    }
}

impl RunStore for InMemoryRunStore {
    fn create(&self, run_id: &str) -> Result<()> {
        validate_run_id(run_id)?;
        self.write_lock()?
            .entry(run_id.to_string())
            .or_insert_with(|| RunRecord::new(run_id));
        Ok(())
    }

    fn create_new(&self, record: &RunRecord) -> Result<()> {
        validate_run_id(&record.run_id)?;
        record.check_extra_keys()?;
        let mut runs = self.write_lock()?;
        if runs.contains_key(&record.run_id) {
            return Err(XaelaiError::already_exists(&record.run_id));
        }
        runs.insert(record.run_id.clone(), record.clone());
        Ok(())
    }

    fn read(&self, run_id: &str) -> Result<Option<RunRecord>> {
        validate_run_id(run_id)?;
        Ok(self.read_lock()?.get(run_id).cloned())
    }

    fn upsert(&self, record: &RunRecord) -> Result<()> {
        validate_run_id(&record.run_id)?;
        record.check_extra_keys()?;
        self.write_lock()?
            .insert(record.run_id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, run_id: &str) -> Result<()> {
        validate_run_id(run_id)?;
        self.write_lock()?.remove(run_id);
        Ok(())
    }

    fn list_ids(&self, user_id: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .read_lock()?
            .values()
            .filter(|r| user_id.is_none_or(|u| r.is_owned_by(u)))
            .map(|r| r.run_id.clone())
            .collect())
    }

    fn list_all(&self) -> Result<RunListing> {
        Ok(RunListing {
            records: self.read_lock()?.values().cloned().collect(),
            skipped: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crud() {
        let store = InMemoryRunStore::new();

        store.create("run-1").unwrap();
        assert!(store.read("run-1").unwrap().is_some());

        store
            .upsert(&RunRecord::new("run-1").with_name("Trip planning"))
            .unwrap();
        store.create("run-1").unwrap();
        assert_eq!(store.read("run-1").unwrap().unwrap().run_name, "Trip planning");

        store.delete("run-1").unwrap();
        store.delete("run-1").unwrap();
        assert!(store.read("run-1").unwrap().is_none());
    }

    #[test]
    fn test_create_new_collision() {
        let store = InMemoryRunStore::new();
        store.create_new(&RunRecord::new("r")).unwrap();
        assert!(store.create_new(&RunRecord::new("r")).unwrap_err().is_already_exists());
    }

    #[test]
    fn test_list_by_user() {
        let store = InMemoryRunStore::new();
        store.upsert(&RunRecord::new("a").with_user("alice")).unwrap();
        store.upsert(&RunRecord::new("b").with_user("bob")).unwrap();

        assert_eq!(store.list_ids(Some("bob")).unwrap(), vec!["b".to_string()]);
        assert_eq!(store.list_ids(None).unwrap().len(), 2);
        assert!(store.list_all().unwrap().is_complete());
    }

    #[test]
    fn test_rejects_invalid_ids() {
        let store = InMemoryRunStore::new();
        assert!(store.create("a/b").unwrap_err().is_invalid_name());
    }
}
