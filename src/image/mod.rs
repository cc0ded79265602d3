/// Memory card image data structures

/// Data block storage
pub mod block;
/// Block chain traversal and linking
pub mod chain;
/// Header block with the card's metadata frames
pub mod header_block;

pub use block::DataBlock;
pub use chain::{link_blocks, resolve_chain, ChainCursor};
pub use header_block::HeaderBlock;

use crate::error::{McdError, Result};
use crate::format::constants::*;
use crate::frame::DirectoryFrame;
use crate::io::cursor::{ByteReader, ByteWriter};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Main memory card container
///
/// Owns the header block and the 15 data blocks. Encoding a decoded card
/// reproduces the input byte for byte, reserved areas included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCard {
    /// Header block
    pub(crate) header: HeaderBlock,
    /// Data blocks, aligned by index with the directory frames
    pub(crate) blocks: Vec<DataBlock>,
}

impl MemoryCard {
    /// Create a freshly formatted, empty card
    pub fn blank() -> Self {
        Self {
            header: HeaderBlock::blank(),
            blocks: (0..NUM_BLOCKS).map(|_| DataBlock::new()).collect(),
        }
    }

    /// Decode a card from its raw image
    ///
    /// The input must be exactly [`CARD_SIZE`] bytes. Shorter input fails with
    /// a parse error at the offset where data ran out, longer input with
    /// [`McdError::TrailingBytes`].
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let header = HeaderBlock::decode(&mut r)?;

        let mut blocks = Vec::with_capacity(NUM_BLOCKS);
        for _ in 0..NUM_BLOCKS {
            blocks.push(DataBlock::from_slice(r.take(BLOCK_SIZE)?));
        }

        if r.remaining() > 0 {
            return Err(McdError::TrailingBytes(r.remaining()));
        }

        let card = Self { header, blocks };
        card.validate()?;

        debug!(
            files = card.count_files(),
            free = card.free_blocks(),
            "decoded memory card"
        );

        Ok(card)
    }

    /// Read a stream and decode it
    ///
    /// At most one byte past [`CARD_SIZE`] is read, so an oversized stream
    /// fails with `TrailingBytes(1)` without being loaded in full.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut data = Vec::with_capacity(CARD_SIZE + 1);
        reader.take(CARD_SIZE as u64 + 1).read_to_end(&mut data)?;
        Self::decode(&data)
    }

    /// Open a memory card image from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::reader::read_card(path)
    }

    /// Encode the card into exactly [`CARD_SIZE`] bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; CARD_SIZE];
        let mut w = ByteWriter::new(&mut out);

        self.header.encode(&mut w);
        for block in &self.blocks {
            w.put_bytes(block.data());
        }

        out
    }

    /// Save the card image to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }

    /// Check the header frames and every first-link directory frame
    pub fn validate(&self) -> Result<()> {
        self.header.header_frame.validate()?;
        self.header.trailing_frame.validate()?;

        for frame in &self.header.directory_frames {
            frame.validate()?;
        }

        Ok(())
    }

    /// Does the card pass [`MemoryCard::validate`]?
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Number of files, i.e. first-link directory frames
    pub fn count_files(&self) -> usize {
        self.header
            .directory_frames
            .iter()
            .filter(|f| f.is_first())
            .count()
    }

    /// Number of blocks marked available
    pub fn free_blocks(&self) -> usize {
        self.header
            .directory_frames
            .iter()
            .filter(|f| f.is_available())
            .count()
    }

    /// Get the header block
    pub fn header_block(&self) -> &HeaderBlock {
        &self.header
    }

    /// Get all directory frames
    pub fn directory_frames(&self) -> &[DirectoryFrame] {
        &self.header.directory_frames
    }

    /// Get a directory frame by block index
    pub fn directory_frame(&self, index: usize) -> Option<&DirectoryFrame> {
        self.header.directory_frames.get(index)
    }

    /// Get all data blocks
    pub fn blocks(&self) -> &[DataBlock] {
        &self.blocks
    }

    /// Get a data block by index
    pub fn block(&self, index: usize) -> Option<&DataBlock> {
        self.blocks.get(index)
    }

    /// Resolve the blocks of the file starting at `start`, in link order
    pub fn chain(&self, start: usize) -> Result<Vec<usize>> {
        resolve_chain(&self.header.directory_frames, start)
    }

    pub(crate) fn directory_frames_mut(&mut self) -> &mut [DirectoryFrame] {
        &mut self.header.directory_frames
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> Option<&mut DataBlock> {
        self.blocks.get_mut(index)
    }
}

impl Default for MemoryCard {
    fn default() -> Self {
        Self::blank()
    }
}
