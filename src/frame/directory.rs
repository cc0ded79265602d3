use crate::error::{McdError, Result};
use crate::format::constants::*;
use crate::frame::{check_frame_len, BlockStatus, Frame};
use crate::io::cursor::{ByteReader, ByteWriter};

/// Directory frame describing one data block
///
/// The frame of a file's first block also carries the file's identity
/// (country code, product code, identifier) and its declared size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFrame {
    /// Allocation status
    pub status: BlockStatus,
    /// Reserved bytes after the status
    pub reserved1: [u8; 3],
    /// Declared size of the file's data blocks in bytes
    pub size: u32,
    /// Index of the next block in the chain, or [`LAST_LINK`]
    pub link_order: u16,
    /// Country code, e.g. "BE" or "BA"
    pub country_code: [u8; COUNTRY_CODE_LEN],
    /// Product code, e.g. "SLES-00024"
    pub product_code: [u8; PRODUCT_CODE_LEN],
    /// Save identifier chosen by the game
    pub identifier: [u8; IDENTIFIER_LEN],
    /// Reserved bytes before the checksum
    pub reserved2: [u8; 97],
    /// XOR of the preceding 127 bytes
    pub checksum: u8,
}

impl DirectoryFrame {
    /// A free block: status available, no link, checksum computed
    pub fn blank() -> Self {
        let mut frame = Self {
            status: BlockStatus::Available,
            reserved1: [0u8; 3],
            size: 0,
            link_order: LAST_LINK,
            country_code: [0u8; COUNTRY_CODE_LEN],
            product_code: [0u8; PRODUCT_CODE_LEN],
            identifier: [0u8; IDENTIFIER_LEN],
            reserved2: [0u8; 97],
            checksum: 0,
        };
        frame.update_checksum();
        frame
    }

    /// Build the first-link frame for a new file
    ///
    /// Name fields longer than their slot are truncated, shorter ones are NUL
    /// padded. `size` is the length of the file's data blocks.
    pub fn for_file(country_code: &str, product_code: &str, identifier: &str, size: u32) -> Self {
        let mut frame = Self::blank();
        frame.status = BlockStatus::FirstLink;
        frame.size = size;
        copy_padded(&mut frame.country_code, country_code);
        copy_padded(&mut frame.product_code, product_code);
        copy_padded(&mut frame.identifier, identifier);
        frame.update_checksum();
        frame
    }

    /// Read the layout without validating anything
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        check_frame_len(bytes)?;

        let mut r = ByteReader::new(bytes);
        Ok(Self {
            status: BlockStatus::from(r.read_u8()?),
            reserved1: r.read_array()?,
            size: r.read_u32_le()?,
            link_order: r.read_u16_le()?,
            country_code: r.read_array()?,
            product_code: r.read_array()?,
            identifier: r.read_array()?,
            reserved2: r.read_array()?,
            checksum: r.read_u8()?,
        })
    }

    /// Store the recomputed checksum
    pub fn update_checksum(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Check the stored checksum against the contents
    pub fn has_valid_checksum(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Validate the checksum of a first-link frame
    ///
    /// Frames of other blocks are not checked; cards in the wild often carry
    /// stale checksums on them.
    pub fn validate(&self) -> Result<()> {
        if !self.is_first() {
            return Ok(());
        }

        let computed = self.compute_checksum();
        if self.checksum != computed {
            return Err(McdError::BadChecksum {
                frame: "directory",
                stored: self.checksum,
                computed,
            });
        }

        Ok(())
    }

    /// Is this block free?
    pub fn is_available(&self) -> bool {
        self.status == BlockStatus::Available
    }

    /// Is this the first block of a file?
    pub fn is_first(&self) -> bool {
        self.status == BlockStatus::FirstLink
    }

    /// Does the chain continue past this block?
    pub fn has_next(&self) -> bool {
        self.link_order != LAST_LINK
    }

    /// Country code as text
    pub fn country_code(&self) -> String {
        field_to_string(&self.country_code)
    }

    /// Product code as text
    pub fn product_code(&self) -> String {
        field_to_string(&self.product_code)
    }

    /// Identifier as text
    pub fn identifier(&self) -> String {
        field_to_string(&self.identifier)
    }

    /// Raw name bytes: country code, product code and identifier concatenated
    pub fn name_bytes(&self) -> [u8; COUNTRY_CODE_LEN + PRODUCT_CODE_LEN + IDENTIFIER_LEN] {
        let mut name = [0u8; COUNTRY_CODE_LEN + PRODUCT_CODE_LEN + IDENTIFIER_LEN];
        name[..COUNTRY_CODE_LEN].copy_from_slice(&self.country_code);
        name[COUNTRY_CODE_LEN..COUNTRY_CODE_LEN + PRODUCT_CODE_LEN]
            .copy_from_slice(&self.product_code);
        name[COUNTRY_CODE_LEN + PRODUCT_CODE_LEN..].copy_from_slice(&self.identifier);
        name
    }

    /// File name: country code, product code and identifier concatenated
    pub fn filename(&self) -> String {
        field_to_string(&self.name_bytes())
    }

    /// Do both frames name the same file?
    pub fn has_same_name(&self, other: &DirectoryFrame) -> bool {
        self.name_bytes() == other.name_bytes()
    }
}

impl Frame for DirectoryFrame {
    fn decode(bytes: &[u8]) -> Result<Self> {
        let frame = Self::parse(bytes)?;
        frame.validate()?;
        Ok(frame)
    }

    fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        let mut w = ByteWriter::new(&mut out);
        w.put_u8(self.status.into());
        w.put_bytes(&self.reserved1);
        w.put_u32_le(self.size);
        w.put_u16_le(self.link_order);
        w.put_bytes(&self.country_code);
        w.put_bytes(&self.product_code);
        w.put_bytes(&self.identifier);
        w.put_bytes(&self.reserved2);
        w.put_u8(self.checksum);
        out
    }
}

/// Text of a NUL padded field
fn field_to_string(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_end_matches('\0')
        .to_string()
}

fn copy_padded(dest: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(dest.len());
    dest.fill(0);
    dest[..len].copy_from_slice(&bytes[..len]);
}
