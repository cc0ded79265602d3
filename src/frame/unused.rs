use crate::error::Result;
use crate::format::constants::*;
use crate::frame::{check_frame_len, BlockStatus, Frame};
use crate::io::cursor::{ByteReader, ByteWriter};

/// Unused frame in the reserved area after the directory frames
///
/// Carries no checksum and is never validated; every byte is kept so an image
/// re-encodes unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedFrame {
    /// Status, unavailable on a blank card
    pub status: BlockStatus,
    /// Reserved bytes, 0xFF on a blank card
    pub reserved: [u8; 3],
    /// Bytes in the size position
    pub unknown1: [u8; 4],
    /// Link order, [`LAST_LINK`] on a blank card
    pub link_order: u16,
    /// Remaining bytes
    pub unknown2: [u8; 118],
}

impl UnusedFrame {
    /// The unused frame written by a freshly formatted card
    pub fn blank() -> Self {
        Self {
            status: BlockStatus::Unavailable,
            reserved: [0xFF; 3],
            unknown1: [0u8; 4],
            link_order: LAST_LINK,
            unknown2: [0u8; 118],
        }
    }
}

impl Frame for UnusedFrame {
    fn decode(bytes: &[u8]) -> Result<Self> {
        check_frame_len(bytes)?;

        let mut r = ByteReader::new(bytes);
        Ok(Self {
            status: BlockStatus::from(r.read_u8()?),
            reserved: r.read_array()?,
            unknown1: r.read_array()?,
            link_order: r.read_u16_le()?,
            unknown2: r.read_array()?,
        })
    }

    fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        let mut w = ByteWriter::new(&mut out);
        w.put_u8(self.status.into());
        w.put_bytes(&self.reserved);
        w.put_bytes(&self.unknown1);
        w.put_u16_le(self.link_order);
        w.put_bytes(&self.unknown2);
        out
    }
}
