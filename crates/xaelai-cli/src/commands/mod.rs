pub mod chat;
pub mod runs;

use std::path::PathBuf;
use xaelai_core::Result;
use xaelai_infrastructure::{FileRunStore, RecordCodec, Settings};

/// Resolved settings plus the user the command acts for.
pub struct Context {
    settings: Settings,
    user_id: String,
}

impl Context {
    pub fn new(settings: Settings, user_id: String) -> Self {
        Self { settings, user_id }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn codec(&self) -> RecordCodec {
        self.settings.record_format
    }

    pub fn run_store(&self) -> Result<FileRunStore> {
        FileRunStore::new(self.settings.runs_dir(&self.user_id)?, self.codec())
    }

    pub fn chat_history_dir(&self) -> Result<PathBuf> {
        self.settings.chat_history_dir(&self.user_id)
    }
}
