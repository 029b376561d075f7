//! Storage layer for atomic record file operations.

mod atomic_file;

pub use atomic_file::AtomicRecordFile;
pub(crate) use atomic_file::stage_in;
