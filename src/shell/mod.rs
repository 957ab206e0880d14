//! Shell executors for running listing commands
//!
//! Executors abstract where a command runs, allowing the listing code to work with:
//! - A local `sh`
//! - A privileged shell via `su -c`
//! - A remote shell over an SSH exec channel

mod local;
mod runner;
mod ssh;

pub use local::LocalShell;
pub use runner::{run, IsDirectoryRunner, Runner};
pub use ssh::{SshAuth, SshConnectionInfo, SshShell};

use thiserror::Error;

/// Error type for shell operations
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to start shell: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Channel error: {0}")]
    Channel(String),
    #[error("Unexpected output: {0}")]
    UnexpectedOutput(String),
    #[error("Shell lock poisoned")]
    Poisoned,
}

pub type ShellResult<T> = Result<T, ShellError>;

/// Something that can run a shell command and hand back its output lines
///
/// Output is stdout and stderr merged, split into lines, with trailing
/// empty lines removed. A non-zero exit status is not an error: `ls` exits
/// non-zero when only some entries were unreadable.
pub trait ShellExecutor: Send + Sync {
    /// Short description for logs (e.g., "sh", "su", "ssh root@phone")
    fn describe(&self) -> String;

    /// Run one command to completion
    fn run(&self, command: &str) -> ShellResult<Vec<String>>;
}

/// Split captured output into lines, dropping trailing blank lines and CRs
pub(crate) fn split_output(output: &str) -> Vec<String> {
    let mut lines: Vec<String> = output
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Decode raw command output; bytes that are not UTF-8 become U+FFFD
pub(crate) fn decode_output(raw: &[u8]) -> Vec<String> {
    split_output(&String::from_utf8_lossy(raw))
}
