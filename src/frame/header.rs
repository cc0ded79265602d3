use crate::error::{McdError, Result};
use crate::format::constants::*;
use crate::frame::{check_frame_len, Frame};
use crate::io::cursor::{ByteReader, ByteWriter};

/// Header frame, also used for the trailing frame at the end of the header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFrame {
    /// "MC" on a valid card
    pub signature: [u8; 2],
    /// Reserved bytes, zero on a blank card
    pub reserved: [u8; 125],
    /// XOR of the preceding 127 bytes
    pub checksum: u8,
}

impl HeaderFrame {
    /// A header frame with the signature set and checksum computed
    pub fn blank() -> Self {
        let mut frame = Self {
            signature: *HEADER_SIGNATURE,
            reserved: [0u8; 125],
            checksum: 0,
        };
        frame.update_checksum();
        frame
    }

    /// Store the recomputed checksum
    pub fn update_checksum(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Check the stored checksum against the contents
    pub fn has_valid_checksum(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Check the signature
    pub fn has_valid_signature(&self) -> bool {
        &self.signature == HEADER_SIGNATURE
    }

    /// Check signature then checksum, reporting the first failure
    pub fn validate(&self) -> Result<()> {
        if !self.has_valid_signature() {
            return Err(McdError::BadSignature {
                found: self.signature,
            });
        }

        let computed = self.compute_checksum();
        if self.checksum != computed {
            return Err(McdError::BadChecksum {
                frame: "header",
                stored: self.checksum,
                computed,
            });
        }

        Ok(())
    }
}

impl Frame for HeaderFrame {
    fn decode(bytes: &[u8]) -> Result<Self> {
        check_frame_len(bytes)?;

        let mut r = ByteReader::new(bytes);
        let frame = Self {
            signature: r.read_array()?,
            reserved: r.read_array()?,
            checksum: r.read_u8()?,
        };

        frame.validate()?;
        Ok(frame)
    }

    fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        let mut w = ByteWriter::new(&mut out);
        w.put_bytes(&self.signature);
        w.put_bytes(&self.reserved);
        w.put_u8(self.checksum);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_header() {
        let frame = HeaderFrame::blank();
        let bytes = frame.encode();

        assert_eq!(&bytes[..2], b"MC");
        assert!(bytes[2..CHECKSUM_OFFSET].iter().all(|&b| b == 0));
        assert_eq!(bytes[CHECKSUM_OFFSET], 0x0E);
    }

    #[test]
    fn test_decode_blank_header() {
        let bytes = HeaderFrame::blank().encode();
        let frame = HeaderFrame::decode(&bytes).unwrap();
        assert_eq!(frame, HeaderFrame::blank());
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = HeaderFrame::blank().encode();
        bytes[0] = b'X';

        assert!(matches!(
            HeaderFrame::decode(&bytes),
            Err(McdError::BadSignature { found: [b'X', b'C'] })
        ));
    }

    #[test]
    fn test_bad_checksum() {
        let mut bytes = HeaderFrame::blank().encode();
        bytes[10] = 0x01;

        assert!(matches!(
            HeaderFrame::decode(&bytes),
            Err(McdError::BadChecksum { frame: "header", stored: 0x0E, computed: 0x0F })
        ));
    }

    #[test]
    fn test_checksum_is_idempotent() {
        let mut frame = HeaderFrame::blank();
        frame.reserved[0] = 0x42;
        let first = frame.compute_checksum();
        frame.update_checksum();
        assert_eq!(frame.compute_checksum(), first);
        assert!(frame.has_valid_checksum());
    }
}
