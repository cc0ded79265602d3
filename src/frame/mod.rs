/// Memory card frames
///
/// The header block of a card is made of 128 byte frames: a header frame,
/// one directory frame per data block, a run of unused frames, padding and a
/// trailing copy of the header frame.

/// Directory frame (per-block allocation and file identity)
pub mod directory;
/// Header and trailing frame
pub mod header;
/// Unused (reserved) frame
pub mod unused;

pub use directory::DirectoryFrame;
pub use header::HeaderFrame;
pub use unused::UnusedFrame;

use crate::checksum::XorDigest;
use crate::error::{McdError, Result};
use crate::format::constants::*;
use std::fmt;

/// Allocation status of a block, as stored in the first byte of its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    /// First block of a file, carries the file's name and size
    FirstLink,
    /// Block in the middle of a chain
    MiddleLink,
    /// Last block of a multi-block chain
    LastLink,
    /// Free block
    Available,
    /// Reserved or unusable block
    Unavailable,
    /// Any other value found on a card (deleted saves and the like)
    Other(u8),
}

impl From<u8> for BlockStatus {
    fn from(value: u8) -> Self {
        match value {
            STATUS_FIRST_LINK => BlockStatus::FirstLink,
            STATUS_MIDDLE_LINK => BlockStatus::MiddleLink,
            STATUS_LAST_LINK => BlockStatus::LastLink,
            STATUS_AVAILABLE => BlockStatus::Available,
            STATUS_UNAVAILABLE => BlockStatus::Unavailable,
            other => BlockStatus::Other(other),
        }
    }
}

impl From<BlockStatus> for u8 {
    fn from(status: BlockStatus) -> Self {
        match status {
            BlockStatus::FirstLink => STATUS_FIRST_LINK,
            BlockStatus::MiddleLink => STATUS_MIDDLE_LINK,
            BlockStatus::LastLink => STATUS_LAST_LINK,
            BlockStatus::Available => STATUS_AVAILABLE,
            BlockStatus::Unavailable => STATUS_UNAVAILABLE,
            BlockStatus::Other(value) => value,
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockStatus::FirstLink => write!(f, "First"),
            BlockStatus::MiddleLink => write!(f, "Middle"),
            BlockStatus::LastLink => write!(f, "Last"),
            BlockStatus::Available => write!(f, "Free"),
            BlockStatus::Unavailable => write!(f, "Unavailable"),
            BlockStatus::Other(value) => write!(f, "0x{:02X}", value),
        }
    }
}

/// A fixed-layout 128 byte frame
pub trait Frame: Sized {
    /// Decode a frame from exactly [`FRAME_SIZE`] bytes, validating it
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Encode the frame verbatim, without touching its checksum
    fn encode(&self) -> [u8; FRAME_SIZE];

    /// Recompute the checksum the frame should carry
    fn compute_checksum(&self) -> u8 {
        frame_checksum(&self.encode())
    }
}

/// XOR of the first 127 bytes of an encoded frame
pub fn frame_checksum(bytes: &[u8; FRAME_SIZE]) -> u8 {
    XorDigest::checksum(&bytes[..CHECKSUM_OFFSET])
}

/// Reject anything that is not exactly one frame long
pub(crate) fn check_frame_len(bytes: &[u8]) -> Result<()> {
    if bytes.len() != FRAME_SIZE {
        return Err(McdError::parse(
            0,
            format!("frame must be {} bytes, got {}", FRAME_SIZE, bytes.len()),
        ));
    }
    Ok(())
}
