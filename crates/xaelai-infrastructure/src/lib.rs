pub mod chat_history;
pub mod codec;
pub mod config;
pub mod file_run_store;
pub mod in_memory_run_store;
pub mod paths;
pub mod storage;

pub use crate::chat_history::ChatHistorySession;
pub use crate::codec::RecordCodec;
pub use crate::config::Settings;
pub use crate::file_run_store::FileRunStore;
pub use crate::in_memory_run_store::InMemoryRunStore;
pub use crate::paths::XaelaiPaths;
