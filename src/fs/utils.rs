//! Path and mode-string helpers for remote (string) paths

/// Join a listing base path and an entry name
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), name)
}

/// Directory containing `path`, after trailing slashes are dropped.
///
/// Returns `None` for `/`, for top-level paths like `/proc` and for
/// relative paths without a separator.
pub fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    let parent = trimmed[..idx].trim_end_matches('/');
    if parent.is_empty() {
        None
    } else {
        Some(parent)
    }
}

/// Absolute path for a raw symlink target.
///
/// Relative targets are resolved against the parent of the listing base
/// path, not against the entry's own directory.
pub fn resolve_link_target(base_path: &str, raw_target: &str) -> String {
    if raw_target.starts_with('/') {
        return raw_target.to_string();
    }
    format!("{}/{}", parent_path(base_path).unwrap_or(""), raw_target)
}

/// Quote a path for use inside a double-quoted shell word
pub fn shell_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Bits set by each position of a mode string after the type character.
/// The execute slots also carry setuid, setgid and sticky.
const MODE_BITS: [(usize, &[(char, u32)]); 9] = [
    (1, &[('r', 0o400)]),
    (2, &[('w', 0o200)]),
    (3, &[('x', 0o100), ('s', 0o4100), ('S', 0o4000)]),
    (4, &[('r', 0o040)]),
    (5, &[('w', 0o020)]),
    (6, &[('x', 0o010), ('s', 0o2010), ('S', 0o2000)]),
    (7, &[('r', 0o004)]),
    (8, &[('w', 0o002)]),
    (9, &[('x', 0o001), ('t', 0o1001), ('T', 0o1000)]),
];

/// Numeric mode for a string like `drwxr-xr-x`; 0 when it is too short
pub fn parse_unix_permissions(perms: &str) -> u32 {
    let bytes = perms.as_bytes();
    if bytes.len() < 10 {
        return 0;
    }
    MODE_BITS
        .iter()
        .filter_map(|(index, options)| {
            let c = char::from(bytes[*index]);
            options.iter().find(|(expected, _)| *expected == c).map(|(_, bits)| bits)
        })
        .fold(0, |mode, bits| mode | bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/proc/1/"), Some("/proc"));
        assert_eq!(parent_path("/storage/emulated/0"), Some("/storage/emulated"));
        assert_eq!(parent_path("/proc"), None);
        assert_eq!(parent_path("/"), None);
        assert_eq!(parent_path("data"), None);
    }

    #[test]
    fn test_resolve_link_target() {
        assert_eq!(resolve_link_target("/proc/1/", "proc/self"), "/proc/proc/self");
        assert_eq!(resolve_link_target("/", "storage/self/primary"), "/storage/self/primary");
        assert_eq!(resolve_link_target("/proc/1", "/storage/sdcard"), "/storage/sdcard");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "system"), "/system");
        assert_eq!(join_path("/data/", "local"), "/data/local");
        assert_eq!(join_path("", "x"), "x");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/sdcard/My Files"), "\"/sdcard/My Files\"");
        assert_eq!(shell_quote("a\"b$c"), "\"a\\\"b\\$c\"");
    }

    #[test]
    fn test_parse_permissions() {
        assert_eq!(parse_unix_permissions("drwxr-xr-x"), 0o755);
        assert_eq!(parse_unix_permissions("-rw-r--r--"), 0o644);
        assert_eq!(parse_unix_permissions("drwxrwx--x"), 0o771);
        assert_eq!(parse_unix_permissions("drwxrwxrwt"), 0o1777);
        assert_eq!(parse_unix_permissions("-rwsr-x---"), 0o4750);
        assert_eq!(parse_unix_permissions("drwxr-S--T"), 0o3740);
        assert_eq!(parse_unix_permissions("crw-rw----"), 0o660);
        assert_eq!(parse_unix_permissions(""), 0);
    }
}
