//! Record codecs.
//!
//! A codec converts a [`RunRecord`] to and from the text stored in its file.
//! The store holds a codec value chosen at construction time; codecs know
//! nothing about paths or sessions.

use serde::{Deserialize, Serialize};
use xaelai_core::{Result, RunRecord, XaelaiError};

/// Serialization format for run records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordCodec {
    /// One block-style YAML document per file.
    #[default]
    #[serde(alias = "yml")]
    Yaml,
    /// One pretty-printed JSON object per file.
    Json,
}

impl RecordCodec {
    /// File extension (without dot) used for records in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            RecordCodec::Yaml => "yaml",
            RecordCodec::Json => "json",
        }
    }

    /// Human-readable format name, as reported in errors.
    pub fn format_name(&self) -> &'static str {
        match self {
            RecordCodec::Yaml => "YAML",
            RecordCodec::Json => "JSON",
        }
    }

    /// Picks the codec for a file extension (`yaml`, `yml` or `json`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(RecordCodec::Yaml),
            "json" => Some(RecordCodec::Json),
            _ => None,
        }
    }

    /// Encodes a record as file content.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if an `extra` key shadows a typed field.
    pub fn serialize(&self, record: &RunRecord) -> Result<String> {
        record.check_extra_keys()?;

        let encoded = match self {
            RecordCodec::Yaml => serde_yaml::to_string(record).map_err(|e| e.to_string()),
            RecordCodec::Json => serde_json::to_string_pretty(record)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| e.to_string()),
        };

        encoded.map_err(|message| {
            XaelaiError::internal(format!(
                "Failed to encode run '{}' as {}: {}",
                record.run_id,
                self.format_name(),
                message
            ))
        })
    }

    /// Decodes file content into a record.
    ///
    /// `run_id` is only used to label the error.
    ///
    /// # Errors
    ///
    /// Returns `CorruptRecord` for empty or malformed content.
    pub fn deserialize(&self, run_id: &str, text: &str) -> Result<RunRecord> {
        if text.trim().is_empty() {
            return Err(XaelaiError::corrupt(
                run_id,
                self.format_name(),
                "empty record file",
            ));
        }

        let decoded = match self {
            RecordCodec::Yaml => serde_yaml::from_str::<RunRecord>(text).map_err(|e| e.to_string()),
            RecordCodec::Json => serde_json::from_str::<RunRecord>(text).map_err(|e| e.to_string()),
        };

        decoded.map_err(|message| XaelaiError::corrupt(run_id, self.format_name(), message))
    }
}

impl std::fmt::Display for RecordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for RecordCodec {
    type Err = XaelaiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s.trim())
            .ok_or_else(|| XaelaiError::config(format!("unknown record format: {}", s)))
    }
}
