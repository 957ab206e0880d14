//! Command runners: a command string plus the code that interprets its output

use std::sync::Arc;

use crate::fs::utils::shell_quote;

use super::{ShellError, ShellExecutor, ShellResult};

/// A command whose output lines are turned into a typed result
pub trait Runner {
    type Output;

    /// The shell command to execute
    fn command(&self) -> String;

    /// Interpret the command's output lines
    ///
    /// The executor is passed along so runners can issue follow-up queries.
    fn on_result(&self, shell: &Arc<dyn ShellExecutor>, lines: Vec<String>) -> Self::Output;
}

/// Execute a runner's command and interpret its output
///
/// Only a failure to run the command at all is an error here.
pub fn run<R: Runner>(shell: &Arc<dyn ShellExecutor>, runner: &R) -> ShellResult<R::Output> {
    let command = runner.command();
    tracing::debug!(shell = %shell.describe(), %command, "running command");
    let lines = shell.run(&command)?;
    Ok(runner.on_result(shell, lines))
}

/// Asks the shell whether a path is a directory (following symlinks)
#[derive(Debug, Clone)]
pub struct IsDirectoryRunner {
    path: String,
}

impl IsDirectoryRunner {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Runner for IsDirectoryRunner {
    type Output = ShellResult<bool>;

    fn command(&self) -> String {
        format!("test -d {} && echo 1 || echo 0", shell_quote(&self.path))
    }

    fn on_result(&self, _shell: &Arc<dyn ShellExecutor>, lines: Vec<String>) -> ShellResult<bool> {
        match lines.iter().map(|l| l.trim()).find(|l| !l.is_empty()) {
            Some("1") => Ok(true),
            Some("0") => Ok(false),
            Some(other) => Err(ShellError::UnexpectedOutput(other.to_string())),
            None => Err(ShellError::UnexpectedOutput(format!(
                "no output for directory test of {}",
                self.path
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoShell(Vec<&'static str>);

    impl ShellExecutor for EchoShell {
        fn describe(&self) -> String {
            "echo".to_string()
        }

        fn run(&self, _command: &str) -> ShellResult<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn test_is_directory_command() {
        let runner = IsDirectoryRunner::new("/storage/sdcard");
        assert_eq!(runner.command(), "test -d \"/storage/sdcard\" && echo 1 || echo 0");
    }

    #[test]
    fn test_is_directory_results() {
        let runner = IsDirectoryRunner::new("/x");

        let yes: Arc<dyn ShellExecutor> = Arc::new(EchoShell(vec!["1"]));
        assert!(run(&yes, &runner).unwrap().unwrap());

        let no: Arc<dyn ShellExecutor> = Arc::new(EchoShell(vec!["", "0"]));
        assert!(!run(&no, &runner).unwrap().unwrap());

        let garbage: Arc<dyn ShellExecutor> = Arc::new(EchoShell(vec!["su: not found"]));
        assert!(matches!(
            run(&garbage, &runner).unwrap(),
            Err(ShellError::UnexpectedOutput(_))
        ));

        let silent: Arc<dyn ShellExecutor> = Arc::new(EchoShell(vec![]));
        assert!(run(&silent, &runner).unwrap().is_err());
    }
}
