/// Header block: the first 8 KiB of a card

use crate::error::Result;
use crate::format::constants::*;
use crate::frame::{DirectoryFrame, Frame, HeaderFrame, UnusedFrame};
use crate::io::cursor::{ByteReader, ByteWriter};
use tracing::debug;

/// Header block holding the card's metadata frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Leading header frame
    pub(crate) header_frame: HeaderFrame,
    /// One directory frame per data block
    pub(crate) directory_frames: Vec<DirectoryFrame>,
    /// Reserved frames after the directory
    pub(crate) unused_frames: Vec<UnusedFrame>,
    /// Reserved padding before the trailing frame, kept verbatim
    pub(crate) padding: Vec<u8>,
    /// Trailing copy of the header frame
    pub(crate) trailing_frame: HeaderFrame,
}

impl HeaderBlock {
    /// Header block of a freshly formatted card
    pub fn blank() -> Self {
        Self {
            header_frame: HeaderFrame::blank(),
            directory_frames: (0..NUM_DIRECTORY_FRAMES)
                .map(|_| DirectoryFrame::blank())
                .collect(),
            unused_frames: (0..NUM_UNUSED_FRAMES).map(|_| UnusedFrame::blank()).collect(),
            padding: vec![0u8; PADDING_SIZE],
            trailing_frame: HeaderFrame::blank(),
        }
    }

    /// Decode the header block from the reader's current position
    pub(crate) fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let header_frame = HeaderFrame::decode(r.take(FRAME_SIZE)?)?;

        let mut directory_frames = Vec::with_capacity(NUM_DIRECTORY_FRAMES);
        for _ in 0..NUM_DIRECTORY_FRAMES {
            directory_frames.push(DirectoryFrame::decode(r.take(FRAME_SIZE)?)?);
        }

        let mut unused_frames = Vec::with_capacity(NUM_UNUSED_FRAMES);
        for _ in 0..NUM_UNUSED_FRAMES {
            unused_frames.push(UnusedFrame::decode(r.take(FRAME_SIZE)?)?);
        }

        let padding = r.take(PADDING_SIZE)?.to_vec();
        let trailing_frame = HeaderFrame::decode(r.take(FRAME_SIZE)?)?;

        debug!(
            files = directory_frames.iter().filter(|f| f.is_first()).count(),
            "decoded header block"
        );

        Ok(Self {
            header_frame,
            directory_frames,
            unused_frames,
            padding,
            trailing_frame,
        })
    }

    /// Encode the header block at the writer's current position
    pub(crate) fn encode(&self, w: &mut ByteWriter<'_>) {
        w.put_bytes(&self.header_frame.encode());
        for frame in &self.directory_frames {
            w.put_bytes(&frame.encode());
        }
        for frame in &self.unused_frames {
            w.put_bytes(&frame.encode());
        }
        w.put_bytes(&self.padding);
        w.put_bytes(&self.trailing_frame.encode());
    }

    /// Leading header frame
    pub fn header_frame(&self) -> &HeaderFrame {
        &self.header_frame
    }

    /// Trailing copy of the header frame
    pub fn trailing_frame(&self) -> &HeaderFrame {
        &self.trailing_frame
    }

    /// Directory frames, indexed by data block
    pub fn directory_frames(&self) -> &[DirectoryFrame] {
        &self.directory_frames
    }

    /// Unused frames
    pub fn unused_frames(&self) -> &[UnusedFrame] {
        &self.unused_frames
    }

    /// Reserved padding bytes
    pub fn padding(&self) -> &[u8] {
        &self.padding
    }
}
