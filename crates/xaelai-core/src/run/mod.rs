//! Run domain module.
//!
//! # Module Structure
//!
//! - `model`: The persisted run entity (`RunRecord`)
//! - `message`: Conversation message types (`MessageRole`, `RunMessage`)
//! - `store`: Store trait for run persistence (`RunStore`)

mod message;
mod model;
mod store;

// Re-export public API
pub use message::{MESSAGE_FIELDS, MessageRole, RunMessage};
pub use model::{RECORD_FIELDS, RunRecord};
pub use store::{RunListing, RunStore, SkippedRecord};
