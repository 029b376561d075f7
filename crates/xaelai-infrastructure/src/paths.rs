//! Unified path management for xaelai configuration and user data.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/xaelai/              # Config directory
//! └── config.toml                # Application settings
//!
//! <user_data_path>/              # Settings::user_data_path
//! └── <user_id>/
//!     ├── runs/                  # FileRunStore root (<run_id>.<ext>)
//!     └── chat_history/          # ChatHistorySession root
//! ```
//!
//! The user id is supplied by the caller and trusted; it is only checked to
//! be a single, plain path segment.

use std::path::{Path, PathBuf};
use xaelai_core::naming::validate_segment;
use xaelai_core::{Result, XaelaiError};

const APP_NAME: &str = "xaelai";

pub struct XaelaiPaths;

impl XaelaiPaths {
    /// Returns the xaelai configuration directory (e.g. `~/.config/xaelai/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| XaelaiError::config("Cannot find config directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default location for user data when the settings don't name one
    /// (e.g. `~/.local/share/xaelai/`).
    pub fn default_user_data_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .unwrap_or_else(|| PathBuf::from("/user_data"))
    }

    /// Returns `<user_data_path>/<user_id>`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if `user_id` is empty or not a plain segment.
    pub fn user_dir(user_data_path: &Path, user_id: &str) -> Result<PathBuf> {
        validate_segment(user_id)?;
        Ok(user_data_path.join(user_id))
    }

    /// Returns the run store root for a user.
    pub fn runs_dir(user_data_path: &Path, user_id: &str) -> Result<PathBuf> {
        Ok(Self::user_dir(user_data_path, user_id)?.join("runs"))
    }

    /// Returns the chat history root for a user.
    pub fn chat_history_dir(user_data_path: &Path, user_id: &str) -> Result<PathBuf> {
        Ok(Self::user_dir(user_data_path, user_id)?.join("chat_history"))
    }
}
