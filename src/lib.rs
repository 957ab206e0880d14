//! rootls - typed directory listings from `ls -la` output
//!
//! Runs `ls -la` through a local, `su` or SSH shell and parses the text into
//! [`FileEntry`] records. Malformed lines and unreadable entries never fail a
//! listing; only a shell that cannot run the command does.

pub mod config;
pub mod errors;
pub mod fs;
pub mod listing;
pub mod shell;

pub use errors::{AppError, AppResult, ListError};
pub use fs::{EntryKind, FileEntry, SizeField};
pub use listing::{list_directory, ListFileRunner, ListingOptions, Timezone};
pub use shell::{LocalShell, ShellExecutor, SshShell};
