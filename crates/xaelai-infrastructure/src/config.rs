//! Application settings.
//!
//! Settings are read from `~/.config/xaelai/config.toml` and may be
//! overridden by environment-style variables. This module never reads the
//! process environment itself: callers pass the variables in, so library
//! code stays free of ambient state.

use crate::codec::RecordCodec;
use crate::paths::XaelaiPaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use xaelai_core::{Result, XaelaiError};

/// Recognised override variables.
pub const ENV_USER_DATA_PATH: &str = "USER_DATA_PATH";
pub const ENV_DEFAULT_LLM_MODEL: &str = "DEFAULT_LLM_MODEL";
pub const ENV_DEFAULT_EMBEDDINGS_MODEL: &str = "DEFAULT_EMBEDDINGS_MODEL";
pub const ENV_FEATURE_MODEL_MANAGER: &str = "FEATURE_MODEL_MANAGER";
pub const ENV_RECORD_FORMAT: &str = "XAELAI_RECORD_FORMAT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root under which per-user directories are created.
    pub user_data_path: PathBuf,
    pub default_llm_model: String,
    pub default_embeddings_model: String,
    pub feature_model_manager: bool,
    /// Format new run records are written in.
    pub record_format: RecordCodec,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_data_path: XaelaiPaths::default_user_data_path(),
            default_llm_model: "llama3".to_string(),
            default_embeddings_model: "nomic-embed-text".to_string(),
            feature_model_manager: true,
            record_format: RecordCodec::Yaml,
        }
    }
}

impl Settings {
    /// Loads settings from the default config file.
    ///
    /// See [`load_from`](Self::load_from).
    pub fn load() -> Result<Self> {
        Self::load_from(&XaelaiPaths::config_file()?)
    }

    /// Loads settings from `path`.
    ///
    /// # Returns
    ///
    /// - `Ok(Settings)`: Parsed settings, or defaults if the file doesn't
    ///   exist or is empty
    /// - `Err(Config)`: The file exists but is not valid TOML
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config file at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(XaelaiError::config(format!(
                    "Failed to read config file: {}",
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Applies overrides from `vars` (e.g. `std::env::vars()`).
    ///
    /// Unknown variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a recognised variable has an invalid value.
    pub fn with_env_overrides<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_USER_DATA_PATH => self.user_data_path = PathBuf::from(value),
                ENV_DEFAULT_LLM_MODEL => self.default_llm_model = value.to_string(),
                ENV_DEFAULT_EMBEDDINGS_MODEL => self.default_embeddings_model = value.to_string(),
                ENV_FEATURE_MODEL_MANAGER => {
                    self.feature_model_manager = value.trim().eq_ignore_ascii_case("true")
                }
                ENV_RECORD_FORMAT => self.record_format = value.parse()?,
                _ => {}
            }
        }
        Ok(self)
    }

    /// Run store root for `user_id`.
    pub fn runs_dir(&self, user_id: &str) -> Result<PathBuf> {
        XaelaiPaths::runs_dir(&self.user_data_path, user_id)
    }

    /// Chat history root for `user_id`.
    pub fn chat_history_dir(&self, user_id: &str) -> Result<PathBuf> {
        XaelaiPaths::chat_history_dir(&self.user_data_path, user_id)
    }
}
