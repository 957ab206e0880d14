//! `ls -la` listings turned into file entries
//!
//! The pieces, in the order a listing flows through them:
//! - [`classify`]: routes raw lines (entries, permission errors, noise)
//! - [`parser`]: positional parsing of a single entry line
//! - [`resolver`]: directory tests for symlink targets
//!
//! [`ListFileRunner`] ties them together behind the [`Runner`] interface.

pub mod classify;
pub mod parser;
pub mod resolver;

pub use classify::{classify, LineClass, Scanner};
pub use parser::{parse_entry, ParseError};
pub use resolver::LinkResolver;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ListError;
use crate::fs::utils::shell_quote;
use crate::fs::FileEntry;
use crate::shell::{Runner, ShellExecutor};

/// Default listing command; the quoted path is appended
pub const DEFAULT_LS_COMMAND: &str = "ls -la";

/// How listing timestamps are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timezone {
    /// The machine's local time zone
    #[default]
    Local,
    Utc,
}

/// Knobs for a single listing
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Command prefix, e.g. `ls -la` or `ls -la --time-style=long-iso`
    pub ls_command: String,
    pub timezone: Timezone,
    /// Upper bound on time spent resolving symlink targets
    pub link_timeout: Duration,
    /// Parallel directory tests
    pub link_workers: usize,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            ls_command: DEFAULT_LS_COMMAND.to_string(),
            timezone: Timezone::Local,
            link_timeout: Duration::from_secs(5),
            link_workers: 4,
        }
    }
}

/// Lists one directory through a shell
#[derive(Debug, Clone)]
pub struct ListFileRunner {
    path: String,
    options: ListingOptions,
}

impl ListFileRunner {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            options: ListingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ListingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Runner for ListFileRunner {
    type Output = Vec<FileEntry>;

    fn command(&self) -> String {
        format!("{} {}", self.options.ls_command, shell_quote(&self.path))
    }

    fn on_result(&self, shell: &Arc<dyn ShellExecutor>, lines: Vec<String>) -> Vec<FileEntry> {
        let mut scanner = Scanner::new(lines.into_iter(), &self.path, self.options.timezone);
        let mut entries: Vec<FileEntry> = scanner.by_ref().collect();

        let links = entries.iter().filter(|e| e.symlink_target.is_some()).count();
        if links > 0 {
            let resolver = LinkResolver::new(
                Arc::clone(shell),
                self.options.link_workers,
                self.options.link_timeout,
            );
            let resolved = resolver.resolve(&mut entries);
            tracing::debug!(links, resolved, "resolved symlink targets");
        }

        tracing::debug!(
            path = %self.path,
            entries = entries.len(),
            dropped = scanner.dropped(),
            "listing parsed"
        );
        entries
    }
}

/// List `path` through `shell`
///
/// Only a failure to run the listing command is an error; unreadable
/// entries and malformed lines degrade into placeholders or omissions.
/// Entries come back in the order `ls` printed them.
pub fn list_directory(
    shell: &Arc<dyn ShellExecutor>,
    path: &str,
    options: &ListingOptions,
) -> Result<Vec<FileEntry>, ListError> {
    let runner = ListFileRunner::new(path).with_options(options.clone());
    Ok(crate::shell::run(shell, &runner)?)
}
