/// Block chain traversal and linking
///
/// Each directory frame's link order names the next block of the same file,
/// forming a singly linked list over the directory that ends at
/// [`LAST_LINK`].

use crate::error::{McdError, Result};
use crate::format::constants::*;
use crate::frame::{BlockStatus, DirectoryFrame};

/// Cursor walking a file's block chain
///
/// The walk is capped at [`NUM_BLOCKS`] steps, so a looping chain ends in an
/// error instead of spinning.
#[derive(Debug, Clone)]
pub struct ChainCursor<'a> {
    frames: &'a [DirectoryFrame],
    start: usize,
    current: Option<usize>,
    seen: usize,
    failed: bool,
}

impl<'a> ChainCursor<'a> {
    /// Start a walk at `start`, which must be a first-link block
    pub fn new(frames: &'a [DirectoryFrame], start: usize) -> Self {
        Self {
            frames,
            start,
            current: Some(start),
            seen: 0,
            failed: false,
        }
    }

    fn fail(&mut self, message: String) -> Option<Result<usize>> {
        self.failed = true;
        self.current = None;
        Some(Err(McdError::corrupt_chain(self.start, message)))
    }
}

impl Iterator for ChainCursor<'_> {
    type Item = Result<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let index = self.current?;

        if index >= self.frames.len() {
            return self.fail(format!("link to block {} is outside the card", index));
        }

        if self.seen == 0 && !self.frames[index].is_first() {
            return self.fail(format!(
                "block {} is {}, not the first block of a file",
                index, self.frames[index].status
            ));
        }

        if self.seen == NUM_BLOCKS {
            return self.fail(format!("chain is longer than {} blocks", NUM_BLOCKS));
        }

        self.seen += 1;
        let frame = &self.frames[index];
        self.current = if frame.has_next() {
            Some(frame.link_order as usize)
        } else {
            None
        };

        Some(Ok(index))
    }
}

/// Resolve the ordered list of blocks belonging to the file starting at `start`
pub fn resolve_chain(frames: &[DirectoryFrame], start: usize) -> Result<Vec<usize>> {
    ChainCursor::new(frames, start).collect()
}

/// Link `blocks` into one chain in the given order
///
/// The first block becomes the file's first link; a multi-block chain ends
/// with a last link and has middle links in between. Checksums of every
/// touched frame are recomputed.
pub fn link_blocks(frames: &mut [DirectoryFrame], blocks: &[usize]) {
    let count = blocks.len();

    for (i, &block) in blocks.iter().enumerate() {
        let frame = &mut frames[block];

        frame.status = if i == 0 {
            BlockStatus::FirstLink
        } else if i + 1 == count {
            BlockStatus::LastLink
        } else {
            BlockStatus::MiddleLink
        };

        frame.link_order = match blocks.get(i + 1) {
            Some(&next) => next as u16,
            None => LAST_LINK,
        };

        frame.update_checksum();
    }
}
