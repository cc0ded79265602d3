/// Save files on a memory card

use crate::format::constants::*;
use crate::frame::{DirectoryFrame, Frame};
use std::io::{self, Read};

/// A save file: the chain starting at a first-link directory frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Country code, product code and identifier concatenated
    pub name: String,
    /// Raw name bytes with trailing NULs trimmed
    pub name_bytes: Vec<u8>,
    /// Country code, e.g. "BE"
    pub country_code: String,
    /// Product code, e.g. "SLES-00024"
    pub product_code: String,
    /// Save identifier
    pub identifier: String,
    /// Content length: the directory frame plus the declared size
    pub size: u64,
    /// Index of the first block
    pub block: usize,
}

impl File {
    /// Describe the file whose first block is `block`
    pub fn from_frame(block: usize, frame: &DirectoryFrame) -> Self {
        let mut name_bytes = frame.name_bytes().to_vec();
        while name_bytes.last() == Some(&0) {
            name_bytes.pop();
        }

        Self {
            name: frame.filename(),
            name_bytes,
            country_code: frame.country_code(),
            product_code: frame.product_code(),
            identifier: frame.identifier(),
            size: FRAME_SIZE as u64 + frame.size as u64,
            block,
        }
    }

    /// Number of blocks the declared size covers
    pub fn block_count(&self) -> usize {
        (self.size as usize - FRAME_SIZE).div_ceil(BLOCK_SIZE)
    }
}

/// Content stream of one file
///
/// Yields the first directory frame's 128 bytes followed by every block of
/// the chain in link order. Block data is borrowed from the card.
#[derive(Debug, Clone)]
pub struct FileReader<'a> {
    header: [u8; FRAME_SIZE],
    chain: Vec<usize>,
    blocks: Vec<&'a [u8]>,
    pos: usize,
}

impl<'a> FileReader<'a> {
    pub(crate) fn new(frame: &DirectoryFrame, chain: Vec<usize>, blocks: Vec<&'a [u8]>) -> Self {
        Self {
            header: frame.encode(),
            chain,
            blocks,
            pos: 0,
        }
    }

    /// Total length of the stream
    pub fn len(&self) -> usize {
        FRAME_SIZE + self.blocks.len() * BLOCK_SIZE
    }

    /// Is the stream empty? Never true for a resolved file.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block indices of the chain, in link order
    pub fn block_indices(&self) -> &[usize] {
        &self.chain
    }

    /// Bytes not yet read
    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    fn segment(&self, pos: usize) -> &[u8] {
        if pos < FRAME_SIZE {
            return &self.header[pos..];
        }

        let offset = pos - FRAME_SIZE;
        let block = self.blocks[offset / BLOCK_SIZE];
        &block[offset % BLOCK_SIZE..]
    }
}

impl Read for FileReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len() || buf.is_empty() {
            return Ok(0);
        }

        let segment = self.segment(self.pos);
        let n = segment.len().min(buf.len());
        buf[..n].copy_from_slice(&segment[..n]);
        self.pos += n;

        Ok(n)
    }
}
