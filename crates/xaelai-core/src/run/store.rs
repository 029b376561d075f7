//! Run store trait.
//!
//! Defines the interface for run persistence operations.

use super::model::RunRecord;
use crate::error::Result;

/// A record that could not be loaded during a bulk listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub run_id: String,
    pub reason: String,
}

/// Result of [`RunStore::list_all`]: the records that loaded, plus the ones
/// that were skipped because they could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunListing {
    pub records: Vec<RunRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl RunListing {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// An abstract keyed store for assistant runs.
///
/// This trait decouples callers (chat UI, assistant orchestration) from the
/// storage mechanism. Operations are synchronous and run on the caller's
/// thread.
///
/// # Implementation Notes
///
/// - No locking is provided. Two concurrent `upsert`s of the same `run_id`
///   resolve as last-writer-wins.
/// - Every `run_id` must be validated with
///   [`validate_run_id`](crate::naming::validate_run_id) before use.
pub trait RunStore: Send + Sync {
    /// Creates an empty placeholder record if none exists.
    ///
    /// Is a no-op if a record with this id is already stored.
    fn create(&self, run_id: &str) -> Result<()>;

    /// Stores `record` only if no record with the same id exists.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` on collision.
    fn create_new(&self, record: &RunRecord) -> Result<()>;

    /// Reads a record by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(RunRecord))`: Record found
    /// - `Ok(None)`: No record stored under this id
    /// - `Err(CorruptRecord)`: Record exists but could not be decoded
    fn read(&self, run_id: &str) -> Result<Option<RunRecord>>;

    /// Replaces the stored record with `record` (full overwrite).
    fn upsert(&self, record: &RunRecord) -> Result<()>;

    /// Deletes a record. Deleting a missing record is not an error.
    fn delete(&self, run_id: &str) -> Result<()>;

    /// Lists stored run ids, optionally only those owned by `user_id`.
    ///
    /// Order is unspecified.
    fn list_ids(&self, user_id: Option<&str>) -> Result<Vec<String>>;

    /// Loads every stored record.
    ///
    /// Undecodable records are reported in [`RunListing::skipped`] instead of
    /// failing the whole listing.
    fn list_all(&self) -> Result<RunListing>;
}
