//! Routing of raw listing lines, and the lazy scan built on top of it

use std::sync::LazyLock;

use regex::Regex;

use crate::fs::FileEntry;

use super::parser::parse_entry;
use super::Timezone;

const PERMISSION_DENIED: &str = "' failed: Permission denied";
const NO_SUCH_FILE: &str = ": No such file";

/// Block-count header printed by `ls -l`
static SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^total\s+\d+(\.\d+)?[KMGT]?$").expect("valid summary regex"));

/// What a single output line of `ls -la` turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// `lstat '<path>/<name>' failed: Permission denied`; carries the name
    PermissionDenied(String),
    /// `<path>: No such file or directory`
    Missing(&'a str),
    /// `total <blocks>`
    Summary,
    /// `ls: ...` complaint from the tool itself
    Diagnostic(&'a str),
    Blank,
    /// Anything else; handed to the entry parser
    Entry(&'a str),
}

/// Classify one raw line of a listing of `base_path`
pub fn classify<'a>(line: &'a str, base_path: &str) -> LineClass<'a> {
    let line = line.trim();
    if line.is_empty() {
        return LineClass::Blank;
    }

    let lstat_prefix = format!("lstat '{}", base_path);
    if line.starts_with(&lstat_prefix) && line.contains(PERMISSION_DENIED) {
        let name = line.replacen(&lstat_prefix, "", 1).replace(PERMISSION_DENIED, "");
        let name = name.strip_prefix('/').unwrap_or(&name);
        return LineClass::PermissionDenied(name.to_string());
    }

    if line.starts_with('/') && line.contains(NO_SUCH_FILE) {
        return LineClass::Missing(line);
    }

    if SUMMARY.is_match(line) {
        return LineClass::Summary;
    }

    if line.starts_with("ls: ") {
        return LineClass::Diagnostic(line);
    }

    LineClass::Entry(line)
}

/// Consumes raw lines one at a time and yields the entries they describe
///
/// Unparseable lines are logged and skipped; the scan never stops early.
/// Symlink entries come out with `is_dir == false`; resolving their
/// targets is left to the caller.
pub struct Scanner<'a, I> {
    lines: I,
    base_path: &'a str,
    tz: Timezone,
    dropped: usize,
}

impl<'a, I> Scanner<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    pub fn new(lines: I, base_path: &'a str, tz: Timezone) -> Self {
        Self {
            lines,
            base_path,
            tz,
            dropped: 0,
        }
    }

    /// Number of entry lines discarded because they did not parse
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<I> Iterator for Scanner<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        for raw in self.lines.by_ref() {
            match classify(raw.as_ref(), self.base_path) {
                LineClass::PermissionDenied(name) => {
                    return Some(FileEntry::unreadable(name, self.base_path));
                }
                LineClass::Missing(line) => {
                    tracing::debug!(line, "skipping missing path");
                }
                LineClass::Diagnostic(line) => {
                    tracing::debug!(line, "skipping ls diagnostic");
                }
                LineClass::Summary | LineClass::Blank => {}
                LineClass::Entry(line) => match parse_entry(line, self.base_path, self.tz) {
                    Ok(entry) => {
                        tracing::trace!(name = %entry.name, permissions = %entry.permissions, "parsed entry");
                        return Some(entry);
                    }
                    Err(e) => {
                        self.dropped += 1;
                        tracing::warn!(error = %e, line, "parse line error");
                    }
                },
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_permission_denied() {
        assert_eq!(
            classify("lstat '/persist' failed: Permission denied", "/persist"),
            LineClass::PermissionDenied(String::new())
        );
        assert_eq!(
            classify("  lstat '//persist' failed: Permission denied  ", "/"),
            LineClass::PermissionDenied("persist".to_string())
        );
        assert_eq!(
            classify("lstat '/data/app-lib' failed: Permission denied", "/data"),
            LineClass::PermissionDenied("app-lib".to_string())
        );
    }

    #[test]
    fn test_permission_denied_other_base_goes_to_parser() {
        let line = "lstat '/cache/x' failed: Permission denied";
        assert_eq!(classify(line, "/data"), LineClass::Entry(line));
    }

    #[test]
    fn test_missing_path() {
        let line = "/data/data/com.android.shell/files/bugreports: No such file or directory";
        assert_eq!(classify(line, "/data"), LineClass::Missing(line));
    }

    #[test]
    fn test_summary_and_diagnostics() {
        assert_eq!(classify("total 48", "/"), LineClass::Summary);
        assert_eq!(classify("total 1.5K", "/"), LineClass::Summary);
        assert_eq!(
            classify("ls: /nope: No such file or directory", "/nope"),
            LineClass::Diagnostic("ls: /nope: No such file or directory")
        );
        assert_eq!(classify("   ", "/"), LineClass::Blank);
    }

    #[test]
    fn test_entry() {
        let line = "drwxrwx--x 3 root sdcard_rw 4096 2016-12-17 15:02 obb";
        assert_eq!(classify(line, "/"), LineClass::Entry(line));
        // `total` as a file name is still an entry
        let line = "-rw-r--r-- 1 root root 3 2016-12-17 15:02 total 1";
        assert_eq!(classify(line, "/"), LineClass::Entry(line));
    }

    #[test]
    fn test_scanner_skips_and_continues() {
        let lines = vec![
            "total 16",
            "lstat '/persist' failed: Permission denied",
            "drwxr-xr-x 2 root root notanumber 2016-12-17 15:02 weird",
            "/data/data/com.android.shell/files/bugreports: No such file or directory",
            "drwxrwx--x 3 root sdcard_rw 4096 2016-12-17 15:02 obb",
            "",
            "-rw-r--r-- 1 root root 12 2016-12-17 15:02 notes.txt",
        ];
        let mut scanner = Scanner::new(lines.into_iter(), "/persist", Timezone::Utc);
        let names: Vec<(String, bool)> = scanner
            .by_ref()
            .map(|e| (e.name, e.read_available))
            .collect();
        assert_eq!(
            names,
            vec![
                (String::new(), false),
                ("obb".to_string(), true),
                ("notes.txt".to_string(), true),
            ]
        );
        assert_eq!(scanner.dropped(), 1);
    }

    #[test]
    fn test_scanner_is_repeatable() {
        let lines = [
            "drwxrwx--x 3 root sdcard_rw 4096 2016-12-17 15:02 obb",
            "crw-rw---- 1 root audio 116, 0 2016-12-17 15:02 timer",
        ];
        let first: Vec<FileEntry> = Scanner::new(lines.iter(), "/dev", Timezone::Utc).collect();
        let second: Vec<FileEntry> = Scanner::new(lines.iter(), "/dev", Timezone::Utc).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
