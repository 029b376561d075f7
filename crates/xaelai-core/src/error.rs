//! Error types for the xaelai run history.

use thiserror::Error;

/// A shared error type for run and chat-history persistence.
///
/// Variants carry plain strings so the error stays `Clone` and can be handed
/// across layers without holding on to OS handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XaelaiError {
    /// A label or identifier that cannot be turned into a file name.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A strict create collided with an existing record.
    #[error("Record already exists: '{id}'")]
    AlreadyExists { id: String },

    /// A computed path would leave the configured root directory.
    #[error("Path escapes storage root: '{name}'")]
    PathEscape { name: String },

    /// An operation required a record that does not exist.
    #[error("Record not found: '{id}'")]
    RecordNotFound { id: String },

    /// A record file exists but could not be decoded.
    #[error("Corrupt record '{run_id}': {format} - {message}")]
    CorruptRecord {
        run_id: String,
        format: String, // "YAML", "JSON"
        message: String,
    },

    /// A record that cannot be written as-is.
    #[error("Invalid record '{run_id}': {message}")]
    InvalidRecord { run_id: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl XaelaiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidName error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an AlreadyExists error
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Creates a PathEscape error
    pub fn path_escape(name: impl Into<String>) -> Self {
        Self::PathEscape { name: name.into() }
    }

    /// Creates a RecordNotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Creates a CorruptRecord error
    pub fn corrupt(
        run_id: impl Into<String>,
        format: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CorruptRecord {
            run_id: run_id.into(),
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidRecord error
    pub fn invalid_record(run_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            run_id: run_id.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_invalid_name(&self) -> bool {
        matches!(self, Self::InvalidName { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_path_escape(&self) -> bool {
        matches!(self, Self::PathEscape { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }

    pub fn is_invalid_record(&self) -> bool {
        matches!(self, Self::InvalidRecord { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns a message suitable for showing to the end user.
    ///
    /// Never includes file system paths or lower-level error details; those
    /// belong in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidName { name, .. } => format!("'{}' is not a valid name", name),
            Self::AlreadyExists { id } => format!("a session named '{}' already exists", id),
            Self::PathEscape { .. } => "that name is not allowed".to_string(),
            Self::RecordNotFound { id } => format!("session '{}' not found", id),
            Self::CorruptRecord { run_id, .. } => {
                format!("could not load history for '{}'", run_id)
            }
            Self::InvalidRecord { run_id, .. } => {
                format!("history for '{}' could not be saved", run_id)
            }
            Self::Io { .. } => "could not access the history storage".to_string(),
            Self::Config(_) => "the configuration could not be loaded".to_string(),
            Self::Internal(_) => "an unexpected error occurred".to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for XaelaiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for XaelaiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML parse error: {}", err))
    }
}

/// A type alias for `Result<T, XaelaiError>`.
pub type Result<T> = std::result::Result<T, XaelaiError>;
