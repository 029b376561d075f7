//! Run domain model.
//!
//! A run is one persisted assistant conversation. The record is rewritten as a
//! whole on every persist; there is no partial update.

use super::message::{MessageRole, RunMessage};
use crate::error::{Result, XaelaiError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use uuid::Uuid;

/// On-disk keys owned by [`RunRecord`]'s typed fields.
pub const RECORD_FIELDS: [&str; 6] = [
    "run_id",
    "run_name",
    "user_id",
    "messages",
    "created_at",
    "updated_at",
];

/// A persisted assistant run.
///
/// Field names are the on-disk keys for every codec, so files stay readable
/// by external tooling. Keys this type does not know about are collected into
/// `extra` and written back on the next persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Storage key and file stem. Immutable once created.
    pub run_id: String,
    /// Human-editable run name (not unique).
    #[serde(default)]
    pub run_name: String,
    /// Owner of the run, if the caller recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Ordered conversation messages.
    #[serde(default)]
    pub messages: Vec<RunMessage>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl RunRecord {
    /// Creates an empty record for `run_id`.
    pub fn new(run_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            run_name: String::new(),
            user_id: None,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            extra: BTreeMap::new(),
        }
    }

    /// Creates an empty record with a freshly generated UUID v4 id.
    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = run_name.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_messages(mut self, messages: Vec<RunMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Appends a message and bumps `updated_at`.
    pub fn push_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(RunMessage::new(role, content));
        self.touch();
    }

    /// Changes the human-facing name and bumps `updated_at`.
    pub fn rename(&mut self, run_name: impl Into<String>) {
        self.run_name = run_name.into();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Checks that no `extra` key, on the record or any message, shadows a
    /// typed field. Such a record would encode with duplicate keys.
    pub fn check_extra_keys(&self) -> Result<()> {
        let reserved = self
            .extra
            .keys()
            .map(String::as_str)
            .find(|key| RECORD_FIELDS.contains(key));
        if let Some(key) = reserved {
            return Err(XaelaiError::invalid_record(
                &self.run_id,
                format!("extra key '{}' collides with a record field", key),
            ));
        }

        for (index, message) in self.messages.iter().enumerate() {
            if let Some(key) = message.reserved_extra_key() {
                return Err(XaelaiError::invalid_record(
                    &self.run_id,
                    format!(
                        "extra key '{}' of message {} collides with a message field",
                        key, index
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Returns true if the record belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}
