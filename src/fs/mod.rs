//! Filesystem entry model

pub mod entry;
pub mod utils;

pub use entry::{EntryKind, FileEntry, SizeField};
