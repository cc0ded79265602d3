/// Read-only, duplicate-aware filesystem over a memory card

use crate::error::{McdError, Result};
use crate::filesystem::{
    is_valid_path, DirEntry, File, FileMode, FileReader, FileSystem, FileSystemInfo,
    Metadata,
};
use crate::format::constants::*;
use crate::image::MemoryCard;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

/// One slot of the sorted directory index
#[derive(Debug, Clone)]
struct IndexEntry {
    /// Full slash separated name, raw card bytes
    name: Vec<u8>,
    /// Index into the reader's files, `None` for a directory
    file: Option<usize>,
    /// More than one file or directory claims this name
    duplicate: bool,
}

impl IndexEntry {
    fn is_dir(&self) -> bool {
        self.file.is_none()
    }

    fn parent(&self) -> &[u8] {
        split_bytes(&self.name).0
    }

    fn leaf(&self) -> &[u8] {
        split_bytes(&self.name).1
    }

    /// Leaf name for display
    fn leaf_name(&self) -> String {
        String::from_utf8_lossy(self.leaf()).into_owned()
    }
}

/// Result of opening a path
#[derive(Debug)]
pub enum OpenEntry<'a> {
    /// A file's content stream
    File(FileReader<'a>),
    /// A directory listing
    Dir(ReadDir),
}

/// Directory listing consumed in batches or as an iterator
#[derive(Debug, Clone)]
pub struct ReadDir {
    entries: Vec<DirEntry>,
    offset: usize,
}

impl ReadDir {
    fn new(entries: Vec<DirEntry>) -> Self {
        Self { entries, offset: 0 }
    }

    /// Take the next batch of entries
    ///
    /// With `limit == 0` every remaining entry is returned, possibly none.
    /// Otherwise up to `limit` entries are returned, and `None` once the
    /// listing is exhausted.
    pub fn next_batch(&mut self, limit: usize) -> Option<Vec<DirEntry>> {
        let remaining = self.entries.len() - self.offset;

        if limit > 0 && remaining == 0 {
            return None;
        }

        let n = if limit == 0 { remaining } else { remaining.min(limit) };
        let batch = self.entries[self.offset..self.offset + n].to_vec();
        self.offset += n;

        Some(batch)
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.offset
    }
}

impl Iterator for ReadDir {
    type Item = DirEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.offset).cloned()?;
        self.offset += 1;
        Some(entry)
    }
}

/// Serves the files of a memory card image
///
/// Safe to share between threads; the directory index is built once on first
/// use.
#[derive(Debug)]
pub struct CardReader {
    card: MemoryCard,
    files: Vec<File>,
    index: OnceCell<Vec<IndexEntry>>,
}

impl CardReader {
    /// Serve the files of a decoded card
    pub fn new(card: MemoryCard) -> Self {
        let files = card
            .directory_frames()
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.is_first())
            .map(|(i, frame)| File::from_frame(i, frame))
            .collect();

        Self {
            card,
            files,
            index: OnceCell::new(),
        }
    }

    /// Decode a raw image and serve its files
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::new(MemoryCard::decode(data)?))
    }

    /// Read a stream to its end and serve its files
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(MemoryCard::from_reader(reader)?))
    }

    /// Open a memory card image from disk
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(MemoryCard::open(path)?))
    }

    /// Get the underlying card
    pub fn card(&self) -> &MemoryCard {
        &self.card
    }

    /// Files in block order of their first block
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Open a file's content stream
    pub fn open_file(&self, file: &File) -> Result<FileReader<'_>> {
        let frame = self
            .card
            .directory_frame(file.block)
            .ok_or_else(|| McdError::NotFound(file.name.clone()))?;
        let chain = self.card.chain(file.block)?;
        let blocks = chain
            .iter()
            .map(|&i| self.card.blocks()[i].data())
            .collect();

        Ok(FileReader::new(frame, chain, blocks))
    }

    /// Open a file or directory by path
    pub fn open(&self, path: &str) -> Result<OpenEntry<'_>> {
        if !is_valid_path(path) {
            return Err(McdError::InvalidPath(path.to_string()));
        }

        if path == "." {
            return Ok(OpenEntry::Dir(ReadDir::new(self.list(path))));
        }

        let entry = self.lookup(path)?;
        match entry.file {
            Some(i) => Ok(OpenEntry::File(self.open_file(&self.files[i])?)),
            None => Ok(OpenEntry::Dir(ReadDir::new(self.list(path)))),
        }
    }

    fn index(&self) -> &[IndexEntry] {
        self.index.get_or_init(|| build_index(&self.files))
    }

    /// Find the single entry named `path`
    fn lookup(&self, path: &str) -> Result<&IndexEntry> {
        let (dir, leaf) = split_bytes(path.as_bytes());
        let index = self.index();

        let i = index.partition_point(|e| (e.parent(), e.leaf()) < (dir, leaf));
        match index.get(i) {
            Some(entry) if entry.name == path.as_bytes() => {
                if entry.duplicate {
                    Err(McdError::Duplicate(path.to_string()))
                } else {
                    Ok(entry)
                }
            }
            _ => Err(McdError::NotFound(path.to_string())),
        }
    }

    /// Entries directly inside `dir`, in index order
    fn list(&self, dir: &str) -> Vec<DirEntry> {
        let dir = dir.as_bytes();
        let index = self.index();
        let start = index.partition_point(|e| e.parent() < dir);
        let end = index.partition_point(|e| e.parent() <= dir);

        index[start..end]
            .iter()
            .map(|e| DirEntry {
                name: e.leaf_name(),
                is_dir: e.is_dir(),
                size: e.file.map_or(0, |i| self.files[i].size),
                duplicate: e.duplicate,
            })
            .collect()
    }
}

impl FileSystem for CardReader {
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        if !is_valid_path(path) {
            return Err(McdError::InvalidPath(path.to_string()));
        }

        if path != "." && !self.lookup(path)?.is_dir() {
            return Err(McdError::NotADirectory(path.to_string()));
        }

        Ok(self.list(path))
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self.open(path)? {
            OpenEntry::File(mut reader) => {
                let mut data = Vec::with_capacity(reader.len());
                reader.read_to_end(&mut data)?;
                Ok(data)
            }
            OpenEntry::Dir(_) => Err(McdError::IsADirectory(path.to_string())),
        }
    }

    fn stat(&self, path: &str) -> Result<Metadata> {
        if !is_valid_path(path) {
            return Err(McdError::InvalidPath(path.to_string()));
        }

        if path == "." {
            return Ok(Metadata {
                name: ".".to_string(),
                size: 0,
                modified: SystemTime::UNIX_EPOCH,
                mode: FileMode::DIRECTORY,
            });
        }

        let entry = self.lookup(path)?;
        Ok(Metadata {
            name: entry.leaf_name(),
            size: entry.file.map_or(0, |i| self.files[i].size),
            modified: SystemTime::UNIX_EPOCH,
            mode: if entry.is_dir() {
                FileMode::DIRECTORY
            } else {
                FileMode::FILE
            },
        })
    }

    fn info(&self) -> FileSystemInfo {
        FileSystemInfo {
            fs_type: "PlayStation memory card".to_string(),
            total_blocks: NUM_BLOCKS,
            free_blocks: self.card.free_blocks(),
            block_size: BLOCK_SIZE,
            file_count: self.files.len(),
        }
    }
}

/// Split raw name bytes into parent directory and leaf
///
/// One trailing slash is ignored. Names without a slash live in `.`.
fn split_bytes(name: &[u8]) -> (&[u8], &[u8]) {
    let name = name.strip_suffix(b"/").unwrap_or(name);
    match name.iter().rposition(|&b| b == b'/') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (&b"."[..], name),
    }
}

/// Build the sorted index of files and the directories their names imply
///
/// Names are grouped by their raw bytes, so saves whose names differ only in
/// non-UTF-8 bytes stay distinct.
fn build_index(files: &[File]) -> Vec<IndexEntry> {
    let mut entries: Vec<IndexEntry> = Vec::with_capacity(files.len());
    let mut by_name: HashMap<Vec<u8>, usize> = HashMap::new();

    for (i, file) in files.iter().enumerate() {
        let raw = file.name_bytes.as_slice();
        let name = raw.strip_suffix(b"/").unwrap_or(raw);

        match by_name.get(name) {
            Some(&slot) => entries[slot].duplicate = true,
            None => {
                by_name.insert(name.to_vec(), entries.len());
                entries.push(IndexEntry {
                    name: name.to_vec(),
                    file: Some(i),
                    duplicate: false,
                });
            }
        }

        // Implied ancestors; a file already holding the name collides
        let mut dir = split_bytes(name).0;
        while dir != b"." {
            match by_name.get(dir) {
                Some(&slot) => {
                    if !entries[slot].is_dir() {
                        entries[slot].duplicate = true;
                    }
                    break;
                }
                None => {
                    by_name.insert(dir.to_vec(), entries.len());
                    entries.push(IndexEntry {
                        name: dir.to_vec(),
                        file: None,
                        duplicate: false,
                    });
                }
            }
            dir = split_bytes(dir).0;
        }
    }

    entries.sort_by(|a, b| (a.parent(), a.leaf()).cmp(&(b.parent(), b.leaf())));

    let duplicates = entries.iter().filter(|e| e.duplicate).count();
    if duplicates > 0 {
        warn!(duplicates, "card holds duplicate names, those entries cannot be opened");
    }
    debug!(entries = entries.len(), duplicates, "built directory index");

    entries
}
