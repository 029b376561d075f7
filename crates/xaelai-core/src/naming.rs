//! Name generation for chat-history files and validation of path segments.
//!
//! Generated names have the form `<label>_<YYYY-MM-DD_HH-MM-SS>.<ext>`. The
//! timestamp suffix is fixed width, so labels may themselves contain
//! underscores and still parse back unambiguously.

use crate::error::{Result, XaelaiError};
use chrono::{NaiveDateTime, Timelike};

/// `strftime` format of the timestamp component.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const TIMESTAMP_LEN: usize = "YYYY-MM-DD_HH-MM-SS".len();

/// A generated file name split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub label: String,
    pub created: NaiveDateTime,
    pub extension: String,
}

/// Derives record identifiers from a human label and a timestamp.
pub struct NameGenerator;

impl NameGenerator {
    /// Checks that `label` can be embedded in a file name.
    ///
    /// Rejects empty labels, path separators, control characters, `.`/`..`,
    /// leading dots and percent-encoded sequences.
    pub fn validate_label(label: &str) -> Result<()> {
        validate_segment(label)?;
        if contains_percent_encoding(label) {
            return Err(XaelaiError::invalid_name(
                label,
                "label must not be percent-encoded",
            ));
        }
        Ok(())
    }

    /// Returns `<label>_<timestamp>`; seconds precision.
    pub fn generate_stem(label: &str, when: NaiveDateTime) -> Result<String> {
        Self::validate_label(label)?;
        Ok(format!("{}_{}", label, when.format(TIMESTAMP_FORMAT)))
    }

    /// Returns `<label>_<timestamp>.<extension>`.
    pub fn generate(label: &str, when: NaiveDateTime, extension: &str) -> Result<String> {
        Ok(format!("{}.{}", Self::generate_stem(label, when)?, extension))
    }

    /// Formats a name without validating `label`.
    ///
    /// Only for callers that check the result against a directory boundary
    /// before touching the file system.
    pub fn compose(label: &str, when: NaiveDateTime, extension: &str) -> String {
        format!("{}_{}.{}", label, when.format(TIMESTAMP_FORMAT), extension)
    }

    /// Splits a generated file name into label, timestamp and extension.
    pub fn parse(file_name: &str) -> Result<ParsedName> {
        let malformed = |reason: &str| XaelaiError::invalid_name(file_name, reason);

        let (stem, extension) = file_name
            .rsplit_once('.')
            .ok_or_else(|| malformed("missing extension"))?;
        if extension.is_empty() {
            return Err(malformed("missing extension"));
        }

        let split = stem
            .len()
            .checked_sub(TIMESTAMP_LEN + 1)
            .ok_or_else(|| malformed("missing timestamp"))?;
        let (label, rest) = stem
            .split_at_checked(split)
            .ok_or_else(|| malformed("missing timestamp"))?;
        let timestamp = rest
            .strip_prefix('_')
            .ok_or_else(|| malformed("missing timestamp separator"))?;

        let created = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| malformed(&format!("bad timestamp: {}", e)))?;
        Self::validate_label(label)?;

        Ok(ParsedName {
            label: label.to_string(),
            created,
            extension: extension.to_string(),
        })
    }

    /// Drops sub-second precision, which the file name cannot represent.
    pub fn truncate(when: NaiveDateTime) -> NaiveDateTime {
        when.with_nanosecond(0).unwrap_or(when)
    }
}

/// Validates a run id used as a storage key and file stem.
pub fn validate_run_id(run_id: &str) -> Result<()> {
    validate_segment(run_id)
}

/// Validates a single path segment (run id, label, user id).
pub fn validate_segment(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(XaelaiError::invalid_name(value, "must not be empty"));
    }
    if value == "." || value == ".." {
        return Err(XaelaiError::invalid_name(value, "reserved name"));
    }
    if value.starts_with('.') {
        return Err(XaelaiError::invalid_name(value, "must not start with '.'"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        return Err(XaelaiError::invalid_name(
            value,
            format!("invalid character {:?}", c),
        ));
    }
    Ok(())
}

fn contains_percent_encoding(value: &str) -> bool {
    value
        .as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_generate() {
        let name = NameGenerator::generate("trip", at(14, 5, 9), "json").unwrap();
        assert_eq!(name, "trip_2024-03-09_14-05-09.json");
    }

    #[test]
    fn test_generate_is_deterministic_within_a_second() {
        let when = at(1, 2, 3);
        let later = when + chrono::Duration::milliseconds(400);
        assert_eq!(
            NameGenerator::generate("a", when, "yaml").unwrap(),
            NameGenerator::generate("a", later, "yaml").unwrap()
        );
    }

    #[test]
    fn test_rejects_path_separators() {
        for label in ["../../etc", "a/b", "a\\b", "..", ".", "", "   ", ".hidden", "a\0b"] {
            let err = NameGenerator::generate(label, at(0, 0, 0), "json").unwrap_err();
            assert!(err.is_invalid_name(), "label {:?} should be rejected", label);
        }
    }

    #[test]
    fn test_rejects_percent_encoded_labels() {
        let err = NameGenerator::validate_label("trip%2Fplans").unwrap_err();
        assert!(err.is_invalid_name());
        // A bare percent sign is fine.
        NameGenerator::validate_label("100% done").unwrap();
    }

    #[test]
    fn test_parse_round_trip() {
        let name = NameGenerator::generate("my_long chat", at(23, 59, 1), "yaml").unwrap();
        let parsed = NameGenerator::parse(&name).unwrap();
        assert_eq!(parsed.label, "my_long chat");
        assert_eq!(parsed.created, at(23, 59, 1));
        assert_eq!(parsed.extension, "yaml");
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        for name in ["notes.txt", "trip.json", "trip_2024-13-40_00-00-00.json", "noext"] {
            assert!(NameGenerator::parse(name).is_err(), "{} should not parse", name);
        }
    }

    #[test]
    fn test_run_id_validation() {
        validate_run_id("run-42").unwrap();
        validate_run_id("Trip planning_2024-03-09_14-05-09").unwrap();
        assert!(validate_run_id("").is_err());
        assert!(validate_run_id("../run").is_err());
        assert!(validate_run_id(".run.yaml.tmp").is_err());
    }
}
