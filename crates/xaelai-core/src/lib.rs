pub mod error;
pub mod naming;
pub mod run;

// Re-export common error type
pub use error::{Result, XaelaiError};
pub use naming::{NameGenerator, ParsedName};
pub use run::{MessageRole, RunListing, RunMessage, RunRecord, RunStore, SkippedRecord};
