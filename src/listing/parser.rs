//! Positional parser for a single `ls -la` entry line
//!
//! Handles the layouts emitted by Android toolbox/toybox and by GNU `ls`
//! with ISO dates:
//!
//! ```text
//! drwxrwx--x 3 root sdcard_rw 4096 2016-12-17 15:02 obb
//! drwxr-xr-x root     root              2016-12-17 15:02 acct
//! crw-rw---- 1 root audio 116,   0 2016-12-17 15:02 timer
//! lrwxrwxrwx 1 root root 11 2016-12-17 15:02 sdcard -> /storage/sdcard
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use crate::fs::utils::{join_path, resolve_link_target};
use crate::fs::{FileEntry, SizeField};

use super::Timezone;

/// Why an entry line could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("invalid size field {token:?}")]
    InvalidSize { token: String },
    #[error("symlink without target")]
    EmptyLinkTarget,
}

/// How the columns after the group are laid out, decided by the fourth token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Columns {
    /// size, date, time
    Sized,
    /// date, time (the fourth token was the date)
    DateOnly,
    /// `major,` then minor, date, time
    Device,
    /// `major,minor` in one token, then date, time
    DeviceCompact,
}

/// Space-separated tokens with their byte offsets, empty tokens skipped
fn tokens(line: &str) -> impl Iterator<Item = (usize, &str)> {
    line.split(' ')
        .scan(0usize, |offset, token| {
            let start = *offset;
            *offset += token.len() + 1;
            Some((start, token))
        })
        .filter(|(_, token)| !token.trim().is_empty())
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parse one entry line of a listing of `base_path`
///
/// The line must already be trimmed and must not be one of the error
/// forms handled by the classifier.
pub fn parse_entry(line: &str, base_path: &str, tz: Timezone) -> Result<FileEntry, ParseError> {
    let mut permissions = None;
    let mut owner = None;
    let mut group = None;
    let mut size = None;
    let mut columns = Columns::Sized;
    let mut date: Option<&str> = None;
    let mut time: Option<(usize, &str)> = None;

    let mut index = 0;
    for (offset, token) in tokens(line) {
        match index {
            0 => permissions = Some(token),
            1 => {
                // Hard-link count; stay on the owner column
                if is_digits(token) {
                    continue;
                }
                owner = Some(token);
            }
            2 => group = Some(token),
            3 => {
                if token.contains('-') {
                    columns = Columns::DateOnly;
                    size = Some(SizeField::DateOnly);
                    date = Some(token);
                } else if let Some((major, minor)) = token.split_once(',') {
                    let minor = minor.trim();
                    columns = if minor.is_empty() {
                        Columns::Device
                    } else {
                        Columns::DeviceCompact
                    };
                    size = Some(SizeField::Device {
                        major: major.parse().ok(),
                        minor: minor.parse().ok(),
                    });
                } else {
                    let bytes = token.parse::<u64>().map_err(|_| ParseError::InvalidSize {
                        token: token.to_string(),
                    })?;
                    size = Some(SizeField::Bytes(bytes));
                }
            }
            4 => match columns {
                Columns::DateOnly => time = Some((offset, token)),
                Columns::Device => {
                    if let Some(SizeField::Device { minor, .. }) = &mut size {
                        *minor = token.parse().ok();
                    }
                }
                Columns::Sized | Columns::DeviceCompact => date = Some(token),
            },
            5 => match columns {
                Columns::Sized | Columns::DeviceCompact => time = Some((offset, token)),
                Columns::Device => date = Some(token),
                Columns::DateOnly => {}
            },
            6 => {
                if columns == Columns::Device {
                    time = Some((offset, token));
                }
            }
            _ => break,
        }
        index += 1;
    }

    let permissions = permissions.ok_or(ParseError::MissingField("permissions"))?;
    let size = size.ok_or(ParseError::MissingField("size"))?;
    let (time_offset, time) = time.ok_or(ParseError::MissingField("time"))?;
    let date = date.unwrap_or_default();

    // Slice the original line so names keep their embedded spaces
    let name_and_link = line
        .get(time_offset + time.len() + 1..)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingField("name"))?;

    let is_symlink = permissions.starts_with('l');
    let link = if is_symlink {
        name_and_link
            .split_once(" -> ")
            .or_else(|| name_and_link.strip_suffix(" ->").map(|name| (name, "")))
    } else {
        None
    };
    let (name, symlink_target) = match link {
        Some((name, target)) => {
            let target = target.trim();
            if target.is_empty() {
                return Err(ParseError::EmptyLinkTarget);
            }
            (name.trim(), Some(resolve_link_target(base_path, target)))
        }
        None => (name_and_link, None),
    };

    Ok(FileEntry {
        name: name.to_string(),
        path: join_path(base_path, name),
        permissions: permissions.to_string(),
        owner: owner.map(str::to_string),
        group: group.map(str::to_string),
        size,
        modified: parse_modified(date, time, tz),
        is_dir: permissions.starts_with('d'),
        is_symlink,
        symlink_target,
        read_available: true,
    })
}

/// Combine the date and time tokens; anything unparseable becomes the epoch
fn parse_modified(date: &str, time: &str, tz: Timezone) -> SystemTime {
    let joined = format!("{}{}", date, time);
    let naive = NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d%H:%M:%S"));
    let Ok(naive) = naive else {
        return UNIX_EPOCH;
    };

    match tz {
        Timezone::Utc => Utc.from_utc_datetime(&naive).into(),
        Timezone::Local => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(SystemTime::from)
            .unwrap_or(UNIX_EPOCH),
    }
}
