/// Read-only filesystem view of a memory card

/// Files and their content streams
pub mod file;
/// Card reader with the sorted directory index
pub mod reader;

pub use file::{File, FileReader};
pub use reader::{CardReader, OpenEntry, ReadDir};

use crate::error::{McdError, Result};
use std::fmt;
use std::time::SystemTime;

/// File mode bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(pub u32);

impl FileMode {
    /// Directory flag
    pub const DIR: u32 = 1 << 31;

    /// Mode of every file on a card
    pub const FILE: FileMode = FileMode(0o444);

    /// Mode of every directory on a card
    pub const DIRECTORY: FileMode = FileMode(Self::DIR | 0o555);

    /// Check if the directory flag is set
    #[inline]
    pub fn is_dir(&self) -> bool {
        (self.0 & Self::DIR) != 0
    }

    /// Permission bits
    #[inline]
    pub fn perm(&self) -> u32 {
        self.0 & 0o777
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_dir() { 'd' } else { '-' })?;
        for shift in [6, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            write!(
                f,
                "{}{}{}",
                if bits & 0o4 != 0 { 'r' } else { '-' },
                if bits & 0o2 != 0 { 'w' } else { '-' },
                if bits & 0o1 != 0 { 'x' } else { '-' },
            )?;
        }
        Ok(())
    }
}

/// File or directory metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Leaf name
    pub name: String,
    /// Size in bytes, zero for directories
    pub size: u64,
    /// Always the Unix epoch; cards carry no timestamps
    pub modified: SystemTime,
    /// Mode bits
    pub mode: FileMode,
}

impl Metadata {
    /// Is this a directory?
    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }
}

/// Directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Leaf name
    pub name: String,
    /// Directory flag
    pub is_dir: bool,
    /// Size in bytes, zero for directories
    pub size: u64,
    /// More than one entry carries this name
    pub duplicate: bool,
}

impl DirEntry {
    /// Metadata of the entry, or [`McdError::Duplicate`] for a duplicated name
    pub fn metadata(&self) -> Result<Metadata> {
        if self.duplicate {
            return Err(McdError::Duplicate(self.name.clone()));
        }

        Ok(Metadata {
            name: self.name.clone(),
            size: self.size,
            modified: SystemTime::UNIX_EPOCH,
            mode: if self.is_dir {
                FileMode::DIRECTORY
            } else {
                FileMode::FILE
            },
        })
    }
}

/// Filesystem information
#[derive(Debug)]
pub struct FileSystemInfo {
    /// Filesystem type name
    pub fs_type: String,
    /// Total data blocks on the card
    pub total_blocks: usize,
    /// Free blocks
    pub free_blocks: usize,
    /// Block size in bytes
    pub block_size: usize,
    /// Number of files
    pub file_count: usize,
}

/// Filesystem trait for accessing files on memory card images
pub trait FileSystem {
    /// List the entries of a directory
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Read a file's contents
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Get metadata for a file or directory
    fn stat(&self, path: &str) -> Result<Metadata>;

    /// Get filesystem information
    fn info(&self) -> FileSystemInfo;
}

/// Check a path against the filesystem path rules
///
/// A valid path is `.` alone, or a non-empty relative path of `/` separated
/// elements, none of them empty, `.` or `..`, without a trailing slash.
pub fn is_valid_path(path: &str) -> bool {
    if path == "." {
        return true;
    }

    if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
        return false;
    }

    path.split('/')
        .all(|element| !element.is_empty() && element != "." && element != "..")
}

/// Split a name into its parent directory and leaf
///
/// One trailing slash is ignored. Names without a slash live in `.`.
pub fn split(name: &str) -> (&str, &str) {
    let name = name.strip_suffix('/').unwrap_or(name);
    match name.rfind('/') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (".", name),
    }
}
