/// Memory card image writer
///
/// A [`CardWriter`] builds a new card from independently written files. Each
/// [`FileWriter`] buffers one file privately; nothing reaches the card until
/// the file is closed, at which point the file is validated and its blocks are
/// allocated sequentially.

use crate::error::{McdError, Result};
use crate::format::constants::*;
use crate::frame::DirectoryFrame;
use crate::image::{link_blocks, MemoryCard};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Bytes of one file, private to its handle until commit
#[derive(Debug, Default)]
struct FileBuffer {
    data: Vec<u8>,
    closed: bool,
}

/// Everything a commit touches
#[derive(Debug)]
struct WriterState {
    card: MemoryCard,
    next_free_block: usize,
    /// Open handles in creation order
    open: BTreeMap<u64, Arc<Mutex<FileBuffer>>>,
    next_handle: u64,
    finished: bool,
}

impl WriterState {
    fn free_blocks(&self) -> usize {
        NUM_BLOCKS - self.next_free_block
    }

    /// Validate one file and write it to the next free blocks
    fn commit(&mut self, data: &[u8]) -> Result<()> {
        if data.len() < FRAME_SIZE {
            return Err(McdError::invalid_length(format!(
                "{} bytes is shorter than a directory frame",
                data.len()
            )));
        }

        let (header, payload) = data.split_at(FRAME_SIZE);
        let frame = DirectoryFrame::parse(header)?;

        if self
            .card
            .directory_frames()
            .iter()
            .any(|f| f.is_first() && f.has_same_name(&frame))
        {
            return Err(McdError::DuplicateName(frame.filename()));
        }

        if payload.is_empty() || payload.len() % BLOCK_SIZE != 0 {
            return Err(McdError::invalid_length(format!(
                "{} bytes is not a whole number of blocks",
                payload.len()
            )));
        }

        if payload.len() != frame.size as usize {
            return Err(McdError::invalid_length(format!(
                "{} bytes written, {} declared",
                payload.len(),
                frame.size
            )));
        }

        let needed = payload.len() / BLOCK_SIZE;
        let available = self.free_blocks();
        if needed > available {
            return Err(McdError::NoFreeSpace { needed, available });
        }

        let first = self.next_free_block;
        let blocks: Vec<usize> = (first..first + needed).collect();

        let frames = self.card.directory_frames_mut();
        frames[first] = frame;
        link_blocks(frames, &blocks);

        for (&block, chunk) in blocks.iter().zip(payload.chunks_exact(BLOCK_SIZE)) {
            if let Some(dest) = self.card.block_mut(block) {
                dest.data_mut().copy_from_slice(chunk);
            }
        }

        self.next_free_block += needed;

        debug!(
            name = %self.card.directory_frames()[first].filename(),
            first,
            blocks = needed,
            free = self.free_blocks(),
            "committed file"
        );

        Ok(())
    }
}

/// Builds a new memory card image
///
/// Safe to share between threads; file handles may be written from any
/// thread and are committed in the order their closes take the writer lock.
#[derive(Debug)]
pub struct CardWriter {
    state: Arc<Mutex<WriterState>>,
}

impl CardWriter {
    /// Start a new, blank card
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(WriterState {
                card: MemoryCard::blank(),
                next_free_block: 0,
                open: BTreeMap::new(),
                next_handle: 0,
                finished: false,
            })),
        }
    }

    /// Open a handle for a new file
    ///
    /// The file must be written as its 128-byte directory frame followed by
    /// the number of 8 KiB blocks the frame declares.
    pub fn create_file(&self) -> Result<FileWriter> {
        let mut state = self.state.lock();

        if state.finished {
            return Err(McdError::WriterClosed);
        }

        if state.free_blocks() == 0 {
            return Err(McdError::NoFreeSpace {
                needed: 1,
                available: 0,
            });
        }

        let id = state.next_handle;
        state.next_handle += 1;

        let buffer = Arc::new(Mutex::new(FileBuffer::default()));
        state.open.insert(id, Arc::clone(&buffer));

        Ok(FileWriter {
            id,
            buffer,
            state: Arc::clone(&self.state),
        })
    }

    /// Write a complete file in one call
    pub fn add_file(&self, data: &[u8]) -> Result<()> {
        let file = self.create_file()?;
        if let Err(e) = file.append(data) {
            // A rejected append leaves no open handle behind
            self.state.lock().open.remove(&file.id);
            return Err(e);
        }
        file.close()
    }

    /// Blocks not yet allocated
    pub fn free_blocks(&self) -> usize {
        self.state.lock().free_blocks()
    }

    /// Commit every open handle and encode the card
    ///
    /// Handles are committed in creation order. The first failure is returned
    /// and the writer stays usable; files committed before it stay committed.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut state = self.state.lock();

        if state.finished {
            return Err(McdError::WriterClosed);
        }

        while let Some((_, buffer)) = state.open.pop_first() {
            let data = {
                let mut buffer = buffer.lock();
                buffer.closed = true;
                std::mem::take(&mut buffer.data)
            };
            state.commit(&data)?;
        }

        state.finished = true;
        debug!(
            files = state.card.count_files(),
            free = state.free_blocks(),
            "finished memory card"
        );

        Ok(state.card.encode())
    }

    /// Finish and write the image to `writer`
    pub fn finish_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.finish()?;

        match writer.write_all(&bytes) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::WriteZero => Err(McdError::invalid_length(format!(
                "short write of {} byte memory card",
                bytes.len()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Finish and save the image to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.finish_to(file)
    }
}

impl Default for CardWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for writing one file to a [`CardWriter`]
///
/// Dropping a handle without closing it leaves the file open; it is committed
/// by [`CardWriter::finish`].
#[derive(Debug)]
pub struct FileWriter {
    id: u64,
    buffer: Arc<Mutex<FileBuffer>>,
    state: Arc<Mutex<WriterState>>,
}

impl FileWriter {
    /// Append bytes to the file
    pub fn append(&self, data: &[u8]) -> Result<()> {
        let mut buffer = self.buffer.lock();

        if buffer.closed {
            return Err(McdError::HandleClosed);
        }

        if buffer.data.len() + data.len() > MAX_FILE_SIZE {
            return Err(McdError::invalid_length(format!(
                "file would exceed {} bytes",
                MAX_FILE_SIZE
            )));
        }

        buffer.data.extend_from_slice(data);
        Ok(())
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.lock().data.len()
    }

    /// Has nothing been written yet?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate the file and commit it to the card
    ///
    /// The handle is consumed even when validation fails.
    pub fn close(self) -> Result<()> {
        let mut state = self.state.lock();
        state.open.remove(&self.id);

        let data = {
            let mut buffer = self.buffer.lock();
            if buffer.closed {
                return Err(McdError::HandleClosed);
            }
            buffer.closed = true;
            std::mem::take(&mut buffer.data)
        };

        state.commit(&data)
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn save_file(product: &str, identifier: &str, blocks: usize, fill: u8) -> Vec<u8> {
        let frame =
            DirectoryFrame::for_file("BE", product, identifier, (blocks * BLOCK_SIZE) as u32);
        let mut data = frame.encode().to_vec();
        data.resize(FRAME_SIZE + blocks * BLOCK_SIZE, fill);
        data
    }

    #[test]
    fn test_empty_writer_is_blank_card() {
        let writer = CardWriter::new();
        assert_eq!(writer.finish().unwrap(), MemoryCard::blank().encode());
    }

    #[test]
    fn test_add_file() {
        let writer = CardWriter::new();
        writer.add_file(&save_file("SLES-00024", "TOMBRAID", 2, 0x42)).unwrap();
        assert_eq!(writer.free_blocks(), NUM_BLOCKS - 2);

        let card = MemoryCard::decode(&writer.finish().unwrap()).unwrap();
        assert_eq!(card.count_files(), 1);
        assert_eq!(card.chain(0).unwrap(), vec![0, 1]);
        assert!(card.blocks()[1].data().iter().all(|&b| b == 0x42));
        assert!(card.blocks()[2].is_blank());
    }

    #[test]
    fn test_invalid_lengths() {
        let writer = CardWriter::new();

        assert!(matches!(
            writer.add_file(&[0u8; 10]),
            Err(McdError::InvalidLength(_))
        ));

        let mut data = save_file("SLES-00024", "TOMBRAID", 1, 0);
        data.push(0);
        assert!(matches!(
            writer.add_file(&data),
            Err(McdError::InvalidLength(_))
        ));

        let frame = DirectoryFrame::for_file("BE", "SLES-00024", "TOMBRAID", 0);
        assert!(matches!(
            writer.add_file(&frame.encode()),
            Err(McdError::InvalidLength(_))
        ));

        let mut data = save_file("SLES-00024", "TOMBRAID", 1, 0);
        data.extend_from_slice(&[0u8; BLOCK_SIZE]);
        assert!(matches!(
            writer.add_file(&data),
            Err(McdError::InvalidLength(_))
        ));

        assert_eq!(writer.free_blocks(), NUM_BLOCKS);
        assert_eq!(writer.finish().unwrap(), MemoryCard::blank().encode());
    }

    #[test]
    fn test_append_limit() {
        let writer = CardWriter::new();
        let file = writer.create_file().unwrap();

        file.append(&vec![0u8; MAX_FILE_SIZE]).unwrap();
        assert!(matches!(file.append(&[0]), Err(McdError::InvalidLength(_))));
        assert_eq!(file.len(), MAX_FILE_SIZE);
    }

    #[test]
    fn test_duplicate_name() {
        let writer = CardWriter::new();
        writer.add_file(&save_file("SLES-00024", "TOMBRAID", 1, 1)).unwrap();

        assert!(matches!(
            writer.add_file(&save_file("SLES-00024", "TOMBRAID", 1, 2)),
            Err(McdError::DuplicateName(_))
        ));
        assert_eq!(writer.free_blocks(), NUM_BLOCKS - 1);
    }

    #[test]
    fn test_duplicate_name_between_open_handles() {
        let writer = CardWriter::new();
        let a = writer.create_file().unwrap();
        let b = writer.create_file().unwrap();

        a.append(&save_file("SLES-00024", "TOMBRAID", 1, 1)).unwrap();
        b.append(&save_file("SLES-00024", "TOMBRAID", 1, 2)).unwrap();

        b.close().unwrap();
        assert!(matches!(a.close(), Err(McdError::DuplicateName(_))));

        let card = MemoryCard::decode(&writer.finish().unwrap()).unwrap();
        assert_eq!(card.count_files(), 1);
        assert!(card.blocks()[0].data().iter().all(|&b| b == 2));
    }

    #[test]
    fn test_no_free_space() {
        let writer = CardWriter::new();
        writer.add_file(&save_file("SLES-00001", "A", 14, 0)).unwrap();

        assert!(matches!(
            writer.add_file(&save_file("SLES-00002", "B", 2, 0)),
            Err(McdError::NoFreeSpace {
                needed: 2,
                available: 1
            })
        ));
        assert_eq!(writer.free_blocks(), 1);

        writer.add_file(&save_file("SLES-00003", "C", 1, 0)).unwrap();
        assert!(matches!(
            writer.create_file(),
            Err(McdError::NoFreeSpace { .. })
        ));
    }

    #[test]
    fn test_finish_commits_open_handles_in_order() {
        let writer = CardWriter::new();
        let mut a = writer.create_file().unwrap();
        let b = writer.create_file().unwrap();

        b.append(&save_file("SLES-00002", "B", 1, 0xBB)).unwrap();
        a.write_all(&save_file("SLES-00001", "A", 2, 0xAA)).unwrap();
        drop(a);

        let card = MemoryCard::decode(&writer.finish().unwrap()).unwrap();
        assert_eq!(card.directory_frames()[0].filename(), "BESLES-00001A");
        assert_eq!(card.directory_frames()[2].filename(), "BESLES-00002B");

        assert!(matches!(b.append(&[0]), Err(McdError::HandleClosed)));
        assert!(matches!(b.close(), Err(McdError::HandleClosed)));
        assert!(matches!(writer.finish(), Err(McdError::WriterClosed)));
        assert!(matches!(writer.create_file(), Err(McdError::WriterClosed)));
    }

    #[test]
    fn test_failed_finish_leaves_writer_usable() {
        let writer = CardWriter::new();
        let bad = writer.create_file().unwrap();
        bad.append(&[0u8; 5]).unwrap();

        assert!(matches!(writer.finish(), Err(McdError::InvalidLength(_))));

        writer.add_file(&save_file("SLES-00001", "A", 1, 0)).unwrap();
        let card = MemoryCard::decode(&writer.finish().unwrap()).unwrap();
        assert_eq!(card.count_files(), 1);
    }

    struct ZeroSink;

    impl Write for ZeroSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_finish_to() {
        let mut out = Vec::new();
        CardWriter::new().finish_to(&mut out).unwrap();
        assert_eq!(out.len(), CARD_SIZE);

        assert!(matches!(
            CardWriter::new().finish_to(ZeroSink),
            Err(McdError::InvalidLength(_))
        ));
    }
}
