//! File entry representation

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

use super::utils::{join_path, parse_unix_permissions};

/// What occupies the size column of a long listing line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeField {
    /// A regular length column
    Bytes(u64),
    /// No length column; the fourth token was already the date
    DateOnly,
    /// Character/block device with `major, minor` numbers instead of a size
    Device {
        major: Option<u32>,
        minor: Option<u32>,
    },
}

impl SizeField {
    /// Old integer encoding: the byte count, `-1` for date-only, `-2` for devices
    pub fn legacy_value(&self) -> i64 {
        match self {
            SizeField::Bytes(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            SizeField::DateOnly => -1,
            SizeField::Device { .. } => -2,
        }
    }
}

/// Effective kind of an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
}

/// A single record parsed from a long listing
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileEntry {
    /// File/directory name (not full path)
    pub name: String,
    /// Listing base path joined with the name
    pub path: String,
    /// Raw mode string, e.g. `drwxr-xr-x`
    pub permissions: String,
    /// Owner user name, absent when the line carried none
    pub owner: Option<String>,
    /// Owner group name
    pub group: Option<String>,
    /// Size column contents
    pub size: SizeField,
    /// Last modification time, `UNIX_EPOCH` when the date did not parse
    #[serde(serialize_with = "serialize_epoch_secs")]
    pub modified: SystemTime,
    /// Whether this is a directory (for symlinks: whether the target is one)
    pub is_dir: bool,
    /// Whether this is a symbolic link
    pub is_symlink: bool,
    /// Absolute link target, only set for symlinks
    pub symlink_target: Option<String>,
    /// False for placeholder entries of paths that could not be read
    pub read_available: bool,
}

impl FileEntry {
    /// Placeholder for a path the listing could not stat
    pub fn unreadable(name: impl Into<String>, base_path: &str) -> Self {
        let name = name.into();
        Self {
            path: join_path(base_path, &name),
            name,
            permissions: String::new(),
            owner: None,
            group: None,
            size: SizeField::Bytes(0),
            modified: UNIX_EPOCH,
            is_dir: false,
            is_symlink: false,
            symlink_target: None,
            read_available: false,
        }
    }

    pub fn kind(&self) -> EntryKind {
        if self.is_symlink {
            EntryKind::Symlink
        } else if self.is_dir {
            EntryKind::Directory
        } else {
            EntryKind::Regular
        }
    }

    /// Byte count, 0 when the size column held something else
    pub fn size(&self) -> u64 {
        match self.size {
            SizeField::Bytes(n) => n,
            _ => 0,
        }
    }

    /// Permission bits decoded from the mode string
    pub fn mode(&self) -> u32 {
        parse_unix_permissions(&self.permissions)
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Character or block device
    pub fn is_device(&self) -> bool {
        matches!(self.permissions.chars().next(), Some('c' | 'b'))
    }
}

fn serialize_epoch_secs<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    serializer.serialize_u64(secs)
}
