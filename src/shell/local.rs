//! Local shell executor, optionally elevated through `su`

use std::process::{Command, Stdio};

use super::{decode_output, ShellExecutor, ShellResult};

/// What receives the `-c` script
#[derive(Debug, Clone, PartialEq, Eq)]
enum Launcher {
    /// A plain interpreter such as `sh`
    Interpreter(String),
    /// `su`, which picks root's shell itself
    Su(String),
}

/// Runs commands with a local interpreter (`sh -c`), or through `su -c`
/// when privileged
#[derive(Debug, Clone)]
pub struct LocalShell {
    launcher: Launcher,
}

impl LocalShell {
    /// Plain local shell using the given interpreter
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            launcher: Launcher::Interpreter(program.into()),
        }
    }

    /// Root shell: every command is passed to `<su_program> -c`
    pub fn privileged(su_program: impl Into<String>) -> Self {
        Self {
            launcher: Launcher::Su(su_program.into()),
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self.launcher, Launcher::Su(_))
    }

    fn program(&self) -> &str {
        match &self.launcher {
            Launcher::Interpreter(program) | Launcher::Su(program) => program,
        }
    }

    fn build(&self, command: &str) -> Command {
        // stderr carries the `lstat ... Permission denied` lines
        let script = format!("exec 2>&1; {}", command);
        let mut cmd = Command::new(self.program());
        cmd.arg("-c").arg(script);
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellExecutor for LocalShell {
    fn describe(&self) -> String {
        self.program().to_string()
    }

    fn run(&self, command: &str) -> ShellResult<Vec<String>> {
        let output = self.build(command).output()?;
        if !output.status.success() {
            tracing::debug!(status = ?output.status.code(), command, "command exited non-zero");
        }
        let mut raw = output.stdout;
        raw.extend_from_slice(&output.stderr);
        Ok(decode_output(&raw))
    }
}
